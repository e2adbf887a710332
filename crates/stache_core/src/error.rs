use crate::SourcePos;

/// A fatal compile error. Compilation either produces a complete render
/// program or fails with the first error encountered; there is no recovery.
#[derive(Debug, PartialEq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub pos: SourcePos,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, pos: SourcePos) -> CompileError {
        CompileError { kind, pos }
    }
}

#[derive(Debug, PartialEq)]
pub enum CompileErrorKind {
    // Lexical
    /// `{{}}` or whitespace-only mustache
    EmptyMustache,
    /// `{{{` or `{{&`: escaped/triple mustaches are always rejected
    EscapedMustache,
    /// End of input inside a mustache construct
    UnexpectedEof(&'static str),
    /// Reserved character inside a plain identifier
    IllegalIdentifierChar(char),
    /// `@` past the start of an identifier
    MisplacedAt,
    /// `/` starting an identifier
    MisplacedSolidus,
    /// Malformed `.`/`..` sequence, carries the offending spelling
    IllegalPathSequence(String),
    /// Single `}` where `}}` was required
    UnterminatedMustache(char),
    /// Unexpected character between identifier and `}}`
    UnexpectedAfterTagName(char),
    UnexpectedAfterPartialName(char),
    /// `{{…}}` in the middle of an unquoted attribute value
    MustacheInUnquotedValue,
    /// `{` or `}` where a helper argument value was expected
    UnexpectedInAttrValue(char),

    // Structural
    /// Partial token outside body context
    PartialOutsideBody,
    /// Block open/close/else outside body context
    BlockOutsideBody,
    /// `{{else}}` after something other than an open `if`/`unless`
    ElseAfter(String),
    /// `{{else}}` with no open block at all
    ElseWithoutBlock,
    /// Close tag name does not match the innermost open block
    MismatchedBlockClose { found: String, expected: Option<String> },
    /// Block still open when its enclosing element ends
    UnclosedBlock(String),
    /// Element-located helper other than `if`/`unless`
    HelperInElement(String),
    /// Non-helper mustache among a tag's dynamic attributes
    MustacheInElement,
    /// Inline `if`/`unless` argument arity violation
    InlineCondArity(&'static str),
    /// `{{#each}}` argument was not a path expression
    EachNonPath(String),
    /// `<require>` carried a mustache-bearing attribute
    RequireDynamicAttr,
    /// `<require>` without a `from` attribute
    RequireMissingFrom,
    /// Component attribute that is not a plain or value-mustache attribute
    ComponentMustacheAttr,

    // Semantic
    /// `=` applied to a multi-segment name, `{{helper foo.bar=1}}`
    AssignToPath,
}

impl std::fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CompileErrorKind::*;
        match self {
            EmptyMustache => write!(f, "found empty mustache expression"),
            EscapedMustache => write!(f, "escaped mustache tags are not allowed"),
            UnexpectedEof(context) => {
                write!(f, "unexpected end of input {}", context)
            }
            IllegalIdentifierChar(ch) => {
                write!(f, "illegal character '{}' in mustache identifier", ch)
            }
            MisplacedAt => write!(f, "'@' is only allowed at the start of an identifier"),
            MisplacedSolidus => write!(f, "'/' cannot start a mustache identifier"),
            IllegalPathSequence(seq) => {
                write!(f, "illegal '{}' in mustache identifier path", seq)
            }
            UnterminatedMustache(ch) => {
                write!(f, "expected '}}}}' to close mustache, found '{}'", ch)
            }
            UnexpectedAfterTagName(ch) => {
                write!(f, "unexpected character '{}' after mustache tag name", ch)
            }
            UnexpectedAfterPartialName(ch) => {
                write!(f, "unexpected character '{}' after partial name", ch)
            }
            MustacheInUnquotedValue => write!(
                f,
                "mustache in the middle of an unquoted attribute value"
            ),
            UnexpectedInAttrValue(ch) => write!(
                f,
                "found '{}' while expecting a helper attribute value",
                ch
            ),
            PartialOutsideBody => write!(f, "partials are only allowed in the body"),
            BlockOutsideBody => {
                write!(f, "mustache block tags are only allowed outside HTML tags")
            }
            ElseAfter(tag) => write!(f, "found 'else' after '{}'", tag),
            ElseWithoutBlock => write!(f, "found 'else' with no open block"),
            MismatchedBlockClose { found, expected } => match expected {
                Some(expected) => write!(
                    f,
                    "found closing tag for '{}' while expecting '{}'",
                    found, expected
                ),
                None => write!(f, "found closing tag for '{}' with no open block", found),
            },
            UnclosedBlock(tag) => {
                write!(f, "block '{}' must be closed inside the same element", tag)
            }
            HelperInElement(name) => write!(
                f,
                "helpers are not allowed inside elements, found helper '{}'",
                name
            ),
            MustacheInElement => {
                write!(f, "mustache tags are not supported inside elements")
            }
            InlineCondArity(msg) => write!(f, "{}", msg),
            EachNonPath(arg) => write!(
                f,
                "found non-path expression '{}' after #each block",
                arg
            ),
            RequireDynamicAttr => {
                write!(f, "require tags cannot contain dynamic attributes")
            }
            RequireMissingFrom => {
                write!(f, "require tag must have a 'from' attribute")
            }
            ComponentMustacheAttr => {
                write!(f, "components can only have mustaches as attribute values")
            }
            AssignToPath => write!(f, "cannot assign a value to a multi-segment name"),
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.kind, self.pos.line, self.pos.column
        )
    }
}

impl std::error::Error for CompileError {}
