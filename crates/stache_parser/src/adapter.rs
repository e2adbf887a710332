use stache_core::{ElementData, MustacheToken, NodeId, TreeAdapter};

enum NodeData {
    Root,
    Element(ElementData),
    Mustache(MustacheToken),
    Text(String),
}

struct TreeNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The default tree adapter: a flat arena addressed by [`NodeId`].
/// Node 0 is the synthetic fragment root.
pub struct SyntaxTree {
    nodes: Vec<TreeNode>,
}

impl SyntaxTree {
    pub fn new() -> SyntaxTree {
        SyntaxTree {
            nodes: vec![TreeNode {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        SyntaxTree::new()
    }
}

impl TreeAdapter for SyntaxTree {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn create_element(&mut self, data: ElementData) -> NodeId {
        self.push_node(NodeData::Element(data))
    }

    fn create_mustache(&mut self, token: MustacheToken) -> NodeId {
        self.push_node(NodeData::Mustache(token))
    }

    fn create_text(&mut self, content: String) -> NodeId {
        self.push_node(NodeData::Text(content))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.push(child);
    }

    fn append_text(&mut self, parent: NodeId, content: &str) {
        if content.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent.0 as usize].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last.0 as usize].data {
                existing.push_str(content);
                return;
            }
        }
        let node = self.push_node(NodeData::Text(content.to_string()));
        self.append_child(parent, node);
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0 as usize].children
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0 as usize].parent
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes[node.0 as usize].data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    fn mustache(&self, node: NodeId) -> Option<&MustacheToken> {
        match &self.nodes[node.0 as usize].data {
            NodeData::Mustache(token) => Some(token),
            _ => None,
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0 as usize].data {
            NodeData::Text(content) => Some(content),
            _ => None,
        }
    }
}
