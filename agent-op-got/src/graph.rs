//! The persistent thought graph.
//!
//! Nodes are keyed by monotonically assigned string ids (`"n0"`, `"n1"`,
//! ...). Reads (`get_node`/`leaf_nodes`) take a read lock so concurrent
//! controllers could fan out safely even though the default controller
//! drives the graph sequentially.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// One node in the thought graph.
#[derive(Debug, Clone)]
pub struct ThoughtNode {
    /// This node's unique id.
    pub id: String,
    /// The thought's text content.
    pub content: String,
    /// This node's score, if one has been assigned.
    pub score: f64,
    /// Ids of nodes this node was derived from.
    pub parents: Vec<String>,
    /// Ids of nodes derived from this one.
    pub children: Vec<String>,
}

/// A directed multigraph of thought nodes.
#[derive(Default)]
pub struct ThoughtGraph {
    nodes: RwLock<HashMap<String, ThoughtNode>>,
    next_id: AtomicUsize,
}

impl ThoughtGraph {
    /// Construct an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node derived from `parents`, registering its id on each
    /// parent's children list. Returns the new node's id.
    pub fn add_node(&self, content: impl Into<String>, score: f64, parents: Vec<String>) -> String {
        let id = format!("n{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut nodes = self.nodes.write().expect("lock poisoned");
        for parent in &parents {
            if let Some(parent_node) = nodes.get_mut(parent) {
                parent_node.children.push(id.clone());
            }
        }
        nodes.insert(
            id.clone(),
            ThoughtNode {
                id: id.clone(),
                content: content.into(),
                score,
                parents,
                children: Vec::new(),
            },
        );
        id
    }

    /// Fetch a node by id.
    #[must_use]
    pub fn get_node(&self, id: &str) -> Option<ThoughtNode> {
        self.nodes.read().expect("lock poisoned").get(id).cloned()
    }

    /// All nodes with no children, sorted by id for deterministic ordering.
    #[must_use]
    pub fn leaf_nodes(&self) -> Vec<ThoughtNode> {
        let nodes = self.nodes.read().expect("lock poisoned");
        let mut leaves: Vec<ThoughtNode> = nodes.values().filter(|n| n.children.is_empty()).cloned().collect();
        leaves.sort_by(|a, b| a.id.cmp(&b.id));
        leaves
    }

    /// Total number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    /// Whether the graph has any nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_node_registers_with_parents() {
        let graph = ThoughtGraph::new();
        let root = graph.add_node("root", 0.0, vec![]);
        let child = graph.add_node("child", 0.0, vec![root.clone()]);
        assert_eq!(graph.get_node(&root).unwrap().children, vec![child.clone()]);
        assert_eq!(graph.get_node(&child).unwrap().parents, vec![root]);
    }

    #[test]
    fn leaf_nodes_excludes_parents() {
        let graph = ThoughtGraph::new();
        let root = graph.add_node("root", 0.0, vec![]);
        let child = graph.add_node("child", 0.0, vec![root.clone()]);
        let leaves: Vec<String> = graph.leaf_nodes().into_iter().map(|n| n.id).collect();
        assert_eq!(leaves, vec![child]);
    }

    #[test]
    fn ids_are_monotonic() {
        let graph = ThoughtGraph::new();
        let a = graph.add_node("a", 0.0, vec![]);
        let b = graph.add_node("b", 0.0, vec![]);
        assert_eq!(a, "n0");
        assert_eq!(b, "n1");
    }
}
