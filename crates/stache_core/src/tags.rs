use phf::{phf_set, Set};

/// Tags serialized as a single void instruction with no children traversal.
static VOID_TAGS: Set<&'static str> = phf_set! {
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame",
    "hr", "img", "input", "keygen", "link", "menuitem", "meta", "param",
    "source", "track", "wbr",
};

/// Tags whose content is consumed verbatim, with no mustache or character
/// reference processing.
static RAW_TEXT_TAGS: Set<&'static str> = phf_set! {
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
};

/// Tags whose content allows character references but no markup.
static RCDATA_TAGS: Set<&'static str> = phf_set! {
    "title", "textarea",
};

/// Tags that must keep a leading newline in their first text child.
static PRE_TEXT_TAGS: Set<&'static str> = phf_set! {
    "pre", "textarea", "listing",
};

pub fn is_void_tag(tag_name: &str) -> bool {
    VOID_TAGS.contains(tag_name)
}

pub fn is_raw_text_tag(tag_name: &str) -> bool {
    RAW_TEXT_TAGS.contains(tag_name)
}

pub fn is_rcdata_tag(tag_name: &str) -> bool {
    RCDATA_TAGS.contains(tag_name)
}

pub fn is_pre_text_tag(tag_name: &str) -> bool {
    PRE_TEXT_TAGS.contains(tag_name)
}

/// Tag names with an interior dash are custom components.
pub fn is_component_tag(tag_name: &str) -> bool {
    match tag_name.find('-') {
        Some(idx) => idx > 0,
        None => false,
    }
}
