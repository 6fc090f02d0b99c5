//! Immutable state hierarchy.

use super::state::{NodeId, StateKind, StateNode};
use std::collections::HashMap;
use thiserror::Error;

/// Name given to the implicit root. It is never indexed, so no lookup can
/// reach it by name.
pub const ROOT_NAME: &str = "<root>";

/// A name that does not belong to any declared state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown state '{0}'")]
pub struct UnknownState(pub String);

/// Arena of [`StateNode`]s built once by the builder.
///
/// The tree is plain data (`Send + Sync`) and never changes after
/// construction, so every machine instance compiled from the same definition
/// reads the same tree.
#[derive(Clone, Debug)]
pub struct StateTree {
    nodes: Vec<StateNode>,
    index: HashMap<String, NodeId>,
}

impl StateTree {
    /// Assemble a tree from nodes already validated by the builder.
    ///
    /// `nodes[0]` must be the root and every other node's id must equal its
    /// position.
    pub(crate) fn from_nodes(nodes: Vec<StateNode>) -> Self {
        let index = nodes
            .iter()
            .filter(|node| !node.id.is_root())
            .map(|node| (node.name.clone(), node.id))
            .collect();
        Self { nodes, index }
    }

    pub fn root(&self) -> &StateNode {
        &self.nodes[NodeId::ROOT.0]
    }

    /// Node for an id handed out by this tree.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different tree and is out of range.
    pub fn node(&self, id: NodeId) -> &StateNode {
        &self.nodes[id.0]
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Look up a declared state by name.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Like [`lookup`](Self::lookup), failing with [`UnknownState`].
    pub fn resolve(&self, name: &str) -> Result<NodeId, UnknownState> {
        self.lookup(name).ok_or_else(|| UnknownState(name.to_string()))
    }

    /// Number of declared states (the root is not counted).
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.iter().skip(1)
    }

    /// Proper ancestors of `id`, innermost first, ending with the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// Whether `ancestor` is `node` or lies above it.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|id| id == ancestor)
    }

    /// Whether `node` lies strictly below `ancestor`.
    pub fn is_strict_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        node != ancestor && self.is_ancestor_or_self(ancestor, node)
    }

    /// Least common ancestor of two nodes.
    ///
    /// When one node contains the other, the outer one is returned.
    pub fn lca(&self, a: NodeId, b: NodeId) -> NodeId {
        let (mut a, mut b) = (a, b);
        while self.nodes[a.0].depth > self.nodes[b.0].depth {
            a = self.parent_or_root(a);
        }
        while self.nodes[b.0].depth > self.nodes[a.0].depth {
            b = self.parent_or_root(b);
        }
        while a != b {
            a = self.parent_or_root(a);
            b = self.parent_or_root(b);
        }
        a
    }

    /// Nodes on the way from `ancestor` (exclusive) down to `target`
    /// (inclusive), outermost first.
    pub fn path_from(&self, ancestor: NodeId, target: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = std::iter::once(target)
            .chain(self.ancestors(target))
            .take_while(|&id| id != ancestor)
            .collect();
        path.reverse();
        path
    }

    pub fn kind(&self, id: NodeId) -> StateKind {
        self.nodes[id.0].kind
    }

    fn parent_or_root(&self, id: NodeId) -> NodeId {
        self.nodes[id.0].parent.unwrap_or(NodeId::ROOT)
    }
}

/// Iterator returned by [`StateTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a StateTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes[current.0].parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(
        id: usize,
        name: &str,
        kind: StateKind,
        parent: Option<usize>,
        depth: usize,
    ) -> StateNode {
        StateNode {
            id: NodeId(id),
            name: name.to_string(),
            kind,
            parent: parent.map(NodeId),
            children: Vec::new(),
            initial: None,
            entry_hook: None,
            exit_hook: None,
            depth,
        }
    }

    // root -> { A, P(parallel) -> { P1 -> { X, Y }, P2 } }
    fn sample() -> StateTree {
        let mut nodes = vec![
            node(0, ROOT_NAME, StateKind::Sequential, None, 0),
            node(1, "A", StateKind::Leaf, Some(0), 1),
            node(2, "P", StateKind::Parallel, Some(0), 1),
            node(3, "P1", StateKind::Sequential, Some(2), 2),
            node(4, "X", StateKind::Leaf, Some(3), 3),
            node(5, "Y", StateKind::Leaf, Some(3), 3),
            node(6, "P2", StateKind::Leaf, Some(2), 2),
        ];
        nodes[0].children = vec![NodeId(1), NodeId(2)];
        nodes[0].initial = Some(NodeId(1));
        nodes[2].children = vec![NodeId(3), NodeId(6)];
        nodes[3].children = vec![NodeId(4), NodeId(5)];
        nodes[3].initial = Some(NodeId(4));
        StateTree::from_nodes(nodes)
    }

    #[test]
    fn resolve_finds_declared_states() {
        let tree = sample();
        assert_eq!(tree.resolve("P1"), Ok(NodeId(3)));
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn resolve_rejects_unknown_and_root_names() {
        let tree = sample();
        assert_eq!(tree.resolve("Z"), Err(UnknownState("Z".to_string())));
        assert!(tree.lookup(ROOT_NAME).is_none());
    }

    #[test]
    fn ancestors_walk_innermost_first() {
        let tree = sample();
        let chain: Vec<_> = tree.ancestors(NodeId(5)).collect();
        assert_eq!(chain, vec![NodeId(3), NodeId(2), NodeId::ROOT]);
    }

    #[test]
    fn lca_of_cousins_is_shared_parent() {
        let tree = sample();
        assert_eq!(tree.lca(NodeId(4), NodeId(6)), NodeId(2));
        assert_eq!(tree.lca(NodeId(4), NodeId(5)), NodeId(3));
        assert_eq!(tree.lca(NodeId(1), NodeId(5)), NodeId::ROOT);
    }

    #[test]
    fn lca_of_nested_nodes_is_outer_node() {
        let tree = sample();
        assert_eq!(tree.lca(NodeId(2), NodeId(5)), NodeId(2));
        assert_eq!(tree.lca(NodeId(5), NodeId(5)), NodeId(5));
    }

    #[test]
    fn path_from_is_outermost_first() {
        let tree = sample();
        assert_eq!(
            tree.path_from(NodeId::ROOT, NodeId(5)),
            vec![NodeId(2), NodeId(3), NodeId(5)]
        );
        assert_eq!(tree.path_from(NodeId(3), NodeId(5)), vec![NodeId(5)]);
        assert!(tree.path_from(NodeId(5), NodeId(5)).is_empty());
    }

    #[test]
    fn descendant_checks_are_strict() {
        let tree = sample();
        assert!(tree.is_strict_descendant(NodeId(4), NodeId(2)));
        assert!(!tree.is_strict_descendant(NodeId(2), NodeId(2)));
        assert!(tree.is_ancestor_or_self(NodeId(2), NodeId(2)));
        assert!(!tree.is_ancestor_or_self(NodeId(1), NodeId(4)));
    }
}
