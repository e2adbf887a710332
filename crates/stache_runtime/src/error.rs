use std::error::Error;
use std::fmt;

/// A failure raised while executing a render program. Compilation never
/// produces these; they come from the registries the embedder owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A helper name was invoked but never registered.
    MissingHelper(String),
    /// `{{>name}}` referenced a partial that is not registered.
    MissingPartial(String),
    /// A component tag was compiled but no program is registered for it.
    MissingComponent(String),
    /// `{{> @content}}` outside any component body invocation.
    MissingContent,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingHelper(name) => {
                write!(f, "helper '{}' is not registered", name)
            }
            RenderError::MissingPartial(name) => {
                write!(f, "partial '{}' is not registered", name)
            }
            RenderError::MissingComponent(tag) => {
                write!(f, "component '{}' is not registered", tag)
            }
            RenderError::MissingContent => {
                write!(f, "'@content' used outside a component body")
            }
        }
    }
}

impl Error for RenderError {}
