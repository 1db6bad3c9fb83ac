//! Arena-backed vector tree produced by the renderer.

use crate::renderer::image::ImagePlacement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Top-level container spanning the page.
    Root { width: f64, height: f64 },
    Group,
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: Option<f64>,
    },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Text { x: f64, y: f64, text: String },
    Image(ImagePlacement),
}

impl NodeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Root { .. } => "svg",
            NodeKind::Group => "g",
            NodeKind::Rect { .. } => "rect",
            NodeKind::Line { .. } => "line",
            NodeKind::Text { .. } => "text",
            NodeKind::Image(_) => "image",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Extra attributes in insertion order (`transform`, `tooltip`, ...).
    pub attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Nodes live in one arena; detached subtrees stay allocated but are no
/// longer reachable from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorTree {
    nodes: Vec<Node>,
}

impl VectorTree {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root { width, height }, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_id(&mut self, id: NodeId, value: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.id = Some(value.to_string());
        }
    }

    /// Add `class` unless already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            if !node.has_class(class) {
                node.classes.push(class.to_string());
            }
        }
    }

    /// Remove `class`; returns whether it was present.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                let before = node.classes.len();
                node.classes.retain(|c| c != class);
                node.classes.len() != before
            }
            None => false,
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id).is_some_and(|node| node.has_class(class))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: String) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            match node.attributes.iter_mut().find(|(key, _)| key == name) {
                Some(entry) => entry.1 = value,
                None => node.attributes.push((name.to_string(), value)),
            }
        }
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        match self.nodes.get_mut(id.0) {
            Some(node) => std::mem::take(&mut node.children),
            None => Vec::new(),
        }
    }

    /// Ancestors of `id`, nearest first, `id` included.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |current| {
            self.node(*current).and_then(|node| node.parent)
        })
    }

    /// Reachable nodes below `id` in document order, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Number of allocated nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
