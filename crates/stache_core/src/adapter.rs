use crate::{
    is_component_tag, MustacheKind, MustacheLocation, MustacheToken, SourcePos, TagAttr,
};

/// Handle into a tree adapter's node storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Payload of an element node as stored by a tree adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag_name: String,
    pub attrs: Vec<TagAttr>,
    pub self_closing: bool,
    pub pos: SourcePos,
}

/// The node construction, classification and traversal capability the tree
/// builder and serializer are written against. The parser itself never
/// special-cases tag semantics beyond what the base algorithm requires;
/// everything node-shaped goes through this interface.
pub trait TreeAdapter {
    /// The synthetic root all fragment children hang off.
    fn root(&self) -> NodeId;

    fn create_element(&mut self, data: ElementData) -> NodeId;
    fn create_mustache(&mut self, token: MustacheToken) -> NodeId;
    fn create_text(&mut self, content: String) -> NodeId;

    fn append_child(&mut self, parent: NodeId, child: NodeId);
    /// Append character data, merging with a trailing text child if present.
    fn append_text(&mut self, parent: NodeId, content: &str);

    fn children(&self, node: NodeId) -> &[NodeId];
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn element(&self, node: NodeId) -> Option<&ElementData>;
    fn mustache(&self, node: NodeId) -> Option<&MustacheToken>;
    fn text(&self, node: NodeId) -> Option<&str>;

    fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    fn is_mustache(&self, node: NodeId) -> bool {
        self.mustache(node).is_some()
    }

    fn is_text(&self, node: NodeId) -> bool {
        self.text(node).is_some()
    }

    /// A self-closing `Tag`-kind mustache in body position renders as text
    /// and participates in text coalescing.
    fn is_inline_mustache_text(&self, node: NodeId) -> bool {
        match self.mustache(node) {
            Some(token) => {
                token.kind == MustacheKind::Tag && token.location == MustacheLocation::Body
            }
            None => false,
        }
    }

    /// Component tags carry the reserved `-` separator.
    fn is_component(&self, node: NodeId) -> bool {
        match self.element(node) {
            Some(element) => is_component_tag(&element.tag_name),
            None => false,
        }
    }
}
