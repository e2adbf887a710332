use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum_macros::{AsRefStr, EnumString};

/// A position in the original template source, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(line: u32, column: u32) -> SourcePos {
        SourcePos { line, column }
    }
}

/// The `@`-prefixed special references which may start a mustache path.
///
/// `../` prefixes desugar to [`SpecialRef::Parent`], a leading `.`/`./`
/// or the `this` keyword to [`SpecialRef::This`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString, Serialize, Deserialize,
)]
pub enum SpecialRef {
    #[strum(serialize = "@root")]
    Root,
    #[strum(serialize = "@parent")]
    Parent,
    #[strum(serialize = "@this")]
    This,
    #[strum(serialize = "@key")]
    Key,
    #[strum(serialize = "@index")]
    Index,
    #[strum(serialize = "@first")]
    First,
    #[strum(serialize = "@last")]
    Last,
    #[strum(serialize = "@props")]
    Props,
}

/// One segment of a mustache path expression.
///
/// A `Key` may come from a plain identifier, a numeric literal (`{{-45.67}}`
/// stays a single `"-45.67"` key) or a bracket literal (`[any chars but `]`]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSegment {
    Key(String),
    Special(SpecialRef),
}

impl PathSegment {
    pub fn key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Special(_) => None,
        }
    }

    /// The name an implicit attribute takes from this segment,
    /// e.g. `{{if class="x" hidden}}` sets `hidden`.
    pub fn display_name(&self) -> &str {
        match self {
            PathSegment::Key(key) => key,
            PathSegment::Special(special) => special.as_ref(),
        }
    }
}

/// Paths are short in practice, 4 segments cover the common case.
pub type Path = SmallVec<[PathSegment; 4]>;

/// A literal or path value found in a mustache argument position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    Str(String),
    /// Numeric literals keep their raw spelling: they double as lookup keys.
    Num(String),
    Bool(bool),
    Null,
    Path(Path),
}

impl ArgValue {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ArgValue::Path(path) => Some(path),
            _ => None,
        }
    }

    /// The name used when this value stands in an attribute-name position:
    /// the last path segment for paths, the literal text otherwise.
    pub fn implicit_name(&self) -> String {
        match self {
            ArgValue::Str(s) => s.clone(),
            ArgValue::Num(n) => n.clone(),
            ArgValue::Bool(b) => b.to_string(),
            ArgValue::Null => "null".into(),
            ArgValue::Path(path) => path
                .last()
                .map(|seg| seg.display_name().to_string())
                .unwrap_or_default(),
        }
    }
}

/// An argument inside a mustache tag.
///
/// `{{helper foo bar=baz}}` produces a positional `foo` (`value: None`)
/// and a hash argument `bar=baz` (`value: Some(..)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MustacheArg {
    pub name: ArgValue,
    pub value: Option<ArgValue>,
}

impl MustacheArg {
    pub fn is_positional(&self) -> bool {
        self.value.is_none()
    }
}

/// What kind of mustache construct a token represents.
/// The kind is only final once the closing `}}` has been seen:
/// a plain tag with arguments becomes a `Helper`, a bare `else` an `Else`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MustacheKind {
    Tag,
    Helper,
    BlockOpen,
    InvertedBlockOpen,
    BlockClose,
    Else,
    Partial,
}

/// Where in the surrounding HTML the mustache was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MustacheLocation {
    Body,
    Element,
    AttributeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MustacheToken {
    pub kind: MustacheKind,
    pub path: Path,
    /// Set when the path is a single plain segment (`{{#each}}`, `{{/if}}` …).
    pub tag_name: Option<String>,
    pub args: Vec<MustacheArg>,
    pub location: MustacheLocation,
    pub self_closing: bool,
    pub pos: SourcePos,
}

impl MustacheToken {
    pub fn tag_name(&self) -> &str {
        self.tag_name.as_deref().unwrap_or("")
    }
}

/// A fragment of an HTML attribute value: literal text or an embedded
/// mustache, e.g. `class="a-{{b}}"` has parts `["a-", {{b}}]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrPart {
    Literal(String),
    Expr(MustacheToken),
}

/// A regular HTML attribute with an ordered list of value fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlAttribute {
    pub name: String,
    pub parts: Vec<AttrPart>,
}

impl HtmlAttribute {
    /// `Some(value)` when no mustache is embedded in the value.
    pub fn static_value(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [] => Some(""),
            [AttrPart::Literal(value)] => Some(value),
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.static_value().is_some()
    }
}

/// An entry in a start tag's attribute list. Element-located mustaches
/// (`<p {{if cond class="x"}}>`) live in the same list to keep source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagAttr {
    Html(HtmlAttribute),
    Mustache(MustacheToken),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagToken {
    pub name: String,
    pub attrs: Vec<TagAttr>,
    pub self_closing: bool,
    pub pos: SourcePos,
}

impl TagToken {
    pub fn new(pos: SourcePos) -> TagToken {
        TagToken {
            name: String::new(),
            attrs: Vec::new(),
            self_closing: false,
            pos,
        }
    }
}

/// The token stream produced by the tokenizer. Adjacent character data is
/// batched into a single `Text` token before any non-character token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),
    StartTag(TagToken),
    EndTag(TagToken),
    Mustache(MustacheToken),
    Eof,
}
