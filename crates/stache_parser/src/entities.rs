use phf::{phf_map, Map};

/// Named character references recognized in text and attribute values.
/// Only the `;`-terminated form is decoded; anything else passes through
/// verbatim. The set covers the references that show up in real templates.
static NAMED_ENTITIES: Map<&'static str, &'static str> = phf_map! {
    "amp" => "&",
    "lt" => "<",
    "gt" => ">",
    "quot" => "\"",
    "apos" => "'",
    "nbsp" => "\u{a0}",
    "copy" => "\u{a9}",
    "reg" => "\u{ae}",
    "trade" => "\u{2122}",
    "deg" => "\u{b0}",
    "plusmn" => "\u{b1}",
    "micro" => "\u{b5}",
    "para" => "\u{b6}",
    "middot" => "\u{b7}",
    "sect" => "\u{a7}",
    "laquo" => "\u{ab}",
    "raquo" => "\u{bb}",
    "iexcl" => "\u{a1}",
    "iquest" => "\u{bf}",
    "cent" => "\u{a2}",
    "pound" => "\u{a3}",
    "yen" => "\u{a5}",
    "euro" => "\u{20ac}",
    "times" => "\u{d7}",
    "divide" => "\u{f7}",
    "frac12" => "\u{bd}",
    "frac14" => "\u{bc}",
    "frac34" => "\u{be}",
    "sup1" => "\u{b9}",
    "sup2" => "\u{b2}",
    "sup3" => "\u{b3}",
    "hellip" => "\u{2026}",
    "mdash" => "\u{2014}",
    "ndash" => "\u{2013}",
    "lsquo" => "\u{2018}",
    "rsquo" => "\u{2019}",
    "ldquo" => "\u{201c}",
    "rdquo" => "\u{201d}",
    "bull" => "\u{2022}",
    "dagger" => "\u{2020}",
    "Dagger" => "\u{2021}",
    "larr" => "\u{2190}",
    "uarr" => "\u{2191}",
    "rarr" => "\u{2192}",
    "darr" => "\u{2193}",
    "harr" => "\u{2194}",
    "szlig" => "\u{df}",
    "agrave" => "\u{e0}",
    "aacute" => "\u{e1}",
    "acirc" => "\u{e2}",
    "atilde" => "\u{e3}",
    "auml" => "\u{e4}",
    "aring" => "\u{e5}",
    "aelig" => "\u{e6}",
    "ccedil" => "\u{e7}",
    "egrave" => "\u{e8}",
    "eacute" => "\u{e9}",
    "ecirc" => "\u{ea}",
    "euml" => "\u{eb}",
    "igrave" => "\u{ec}",
    "iacute" => "\u{ed}",
    "icirc" => "\u{ee}",
    "iuml" => "\u{ef}",
    "ntilde" => "\u{f1}",
    "ograve" => "\u{f2}",
    "oacute" => "\u{f3}",
    "ocirc" => "\u{f4}",
    "otilde" => "\u{f5}",
    "ouml" => "\u{f6}",
    "oslash" => "\u{f8}",
    "ugrave" => "\u{f9}",
    "uacute" => "\u{fa}",
    "ucirc" => "\u{fb}",
    "uuml" => "\u{fc}",
    "Auml" => "\u{c4}",
    "Ouml" => "\u{d6}",
    "Uuml" => "\u{dc}",
};

pub(crate) fn lookup(name: &str) -> Option<&'static str> {
    NAMED_ENTITIES.get(name).copied()
}
