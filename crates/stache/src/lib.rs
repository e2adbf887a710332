//! The main public crate of the `stache` project.
//!
//! Templates are plain HTML with mustache expressions. Compiling one yields
//! a [`RenderProgram`], a data-only instruction tree that the runtime
//! executes against live data through any [`Patcher`]:
//!
//! ```
//! use serde_json::json;
//! use stache::{compile, render_to_string, CompileOptions, Registry};
//!
//! let program = compile("<p>{{msg}}</p>", &CompileOptions::default()).unwrap();
//!
//! let registry = Registry::new();
//! let html = render_to_string(&program, &json!({ "msg": "hi" }), &registry).unwrap();
//! assert_eq!(html, "<p>hi</p>");
//! ```
//!
//! Helpers, partials and components are registered on a [`Registry`] the
//! embedding application owns; nothing in the pipeline is global state.

pub use stache_core::*;
pub use stache_parser::{parse_template, SyntaxTree};
pub use stache_runtime::{
    render, render_to_string, HelperInvocation, HtmlWriter, Patcher, Registry, RenderError, Scope,
};

/// Compile a template into its render program.
pub fn compile(source: &str, options: &CompileOptions) -> Result<RenderProgram, CompileError> {
    let tree = stache_parser::parse_template(source)?;
    stache_codegen::serialize(&tree, source, options)
}

/// Compile to the serialized form: the render program as a JSON string,
/// suitable for shipping to another process or caching on disk.
pub fn compile_to_json(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let program = compile(source, options)?;
    Ok(serde_json::to_string(&program).unwrap_or_default())
}
