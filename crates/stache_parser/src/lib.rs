//! HTML fragment parsing with mustache awareness.
//!
//! The tokenizer extends the standard HTML tokenization algorithm with
//! mustache states, entered from character data, from a start tag's
//! attribute list and from attribute values. The tree builder assembles
//! the token stream through a [`TreeAdapter`], so consumers can supply
//! their own node storage.

mod adapter;
mod entities;
mod mustache;
mod tokenizer;
mod tree_builder;

pub use adapter::SyntaxTree;
pub use tokenizer::Tokenizer;
pub use tree_builder::build_tree;

use stache_core::{CompileError, TreeAdapter};

/// Parse a template fragment into the default syntax tree.
pub fn parse_template(source: &str) -> Result<SyntaxTree, CompileError> {
    let mut tree = SyntaxTree::new();
    parse_template_into(source, &mut tree)?;
    Ok(tree)
}

/// Parse a template fragment into a caller-supplied tree adapter.
pub fn parse_template_into<A: TreeAdapter>(
    source: &str,
    tree: &mut A,
) -> Result<(), CompileError> {
    let tokens = Tokenizer::new(source).run()?;
    build_tree(tokens, tree);
    Ok(())
}
