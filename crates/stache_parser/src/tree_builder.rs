use stache_core::{is_void_tag, ElementData, MustacheKind, Token, TreeAdapter};

/// Assemble the token stream into a tree through the adapter.
///
/// Block-open mustaches are pushed like elements but are never popped by
/// their closing tag: the `BlockClose`/`Else` markers land as ordinary
/// children, and the serializer converts the flat marker sequence into
/// nesting, validating open/close pairing as it goes.
///
/// Unlike a browser, the builder keeps the newline right after a
/// `<pre>`/`<textarea>`/`<listing>` start tag: the program must reproduce
/// the template text, and dropping the newline here only to synthesize it
/// again downstream would lose the distinction from a template that never
/// had one.
pub fn build_tree<A: TreeAdapter>(tokens: Vec<Token>, tree: &mut A) {
    let root = tree.root();
    let mut stack = vec![root];
    for token in tokens {
        let parent = stack.last().copied().unwrap_or(root);
        match token {
            Token::Text(text) => {
                tree.append_text(parent, &text);
            }
            Token::StartTag(tag) => {
                let has_children = !is_void_tag(&tag.name) && !tag.self_closing;
                let node = tree.create_element(ElementData {
                    tag_name: tag.name,
                    attrs: tag.attrs,
                    self_closing: tag.self_closing,
                    pos: tag.pos,
                });
                tree.append_child(parent, node);
                if has_children {
                    stack.push(node);
                }
            }
            Token::EndTag(tag) => {
                let found = stack.iter().rposition(|&node| {
                    tree.element(node)
                        .map(|element| element.tag_name == tag.name)
                        .unwrap_or(false)
                });
                // Unmatched end tags are dropped; popping past an open
                // mustache block closes it implicitly, the serializer's
                // marker accounting tolerates that.
                if let Some(idx) = found {
                    if idx > 0 {
                        stack.truncate(idx);
                    }
                }
            }
            Token::Mustache(token) => {
                let opens_block = matches!(
                    token.kind,
                    MustacheKind::BlockOpen | MustacheKind::InvertedBlockOpen
                );
                let node = tree.create_mustache(token);
                tree.append_child(parent, node);
                if opens_block {
                    stack.push(node);
                }
            }
            Token::Eof => break,
        }
    }
}
