//! Semantic roles of rendered nodes.
//!
//! Click, hover and tooltip handling ask this table what a node means
//! instead of re-inspecting classes on the rendered tree.

use std::collections::HashMap;

use crate::tree::{NodeId, VectorTree};

#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    /// Drill-down link; `text` is the visible text of its runs.
    Link { text: String },
    /// Underlay of a detail band; `index` is the band's position in the page.
    DetailBand { index: usize },
    Tooltip { text: String },
}

/// Node → role mapping for one rendered page.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    roles: HashMap<NodeId, Role>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `role` for `node`, replacing any previous role.
    pub fn register(&mut self, node: NodeId, role: Role) {
        self.roles.insert(node, role);
    }

    pub fn role(&self, node: NodeId) -> Option<&Role> {
        self.roles.get(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.roles.contains_key(&node)
    }

    /// Nearest role at or above `node`.
    pub fn resolve<'a>(&'a self, tree: &VectorTree, node: NodeId) -> Option<(NodeId, &'a Role)> {
        tree.ancestors(node)
            .find_map(|id| self.roles.get(&id).map(|role| (id, role)))
    }

    /// Link text when `node` is, or sits inside, a link.
    pub fn link_at(&self, tree: &VectorTree, node: NodeId) -> Option<&str> {
        tree.ancestors(node).find_map(|id| match self.roles.get(&id) {
            Some(Role::Link { text }) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Drop every tooltip registration.
    pub fn clear_tooltips(&mut self) {
        self.roles
            .retain(|_, role| !matches!(role, Role::Tooltip { .. }));
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Role)> {
        self.roles.iter().map(|(id, role)| (*id, role))
    }

    pub fn clear(&mut self) {
        self.roles.clear();
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
