//! State nodes of a compiled hierarchy.
//!
//! Every node lives in the arena owned by [`StateTree`](super::StateTree) and
//! is addressed by its [`NodeId`]. Parent and child links are ids, never
//! references, so a tree can be shared freely between machine instances.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node inside its [`StateTree`](super::StateTree) arena.
///
/// Id `0` is the implicit root. Declared states are numbered from `1` in
/// declaration order, so comparing ids compares declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The implicit root every top-level state hangs from.
    pub const ROOT: NodeId = NodeId(0);

    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }

    /// Whether this is the implicit root.
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a state treats its children.
///
/// # Example
///
/// ```rust
/// use statecraft::core::StateKind;
///
/// let kind: StateKind = serde_json::from_str("\"parallel\"").unwrap();
/// assert_eq!(kind, StateKind::Parallel);
/// assert!(kind.is_composite());
/// assert!(!StateKind::Leaf.is_composite());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    /// Plain state without children.
    #[default]
    Leaf,
    /// Exactly one child is active at a time.
    Sequential,
    /// Every child is active at once, each one an independent region.
    Parallel,
}

impl StateKind {
    /// Whether states of this kind may own children.
    pub fn is_composite(self) -> bool {
        !matches!(self, Self::Leaf)
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Leaf => "leaf",
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        };
        f.write_str(name)
    }
}

/// A single state in a compiled hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: StateKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) initial: Option<NodeId>,
    pub(crate) entry_hook: Option<String>,
    pub(crate) exit_hook: Option<String>,
    pub(crate) depth: usize,
}

impl StateNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    /// Parent node; `None` only for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in declaration order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Default child entered when this sequential composite is entered.
    ///
    /// Always `None` for leaves and parallel composites.
    pub fn initial(&self) -> Option<NodeId> {
        self.initial
    }

    pub fn entry_hook(&self) -> Option<&str> {
        self.entry_hook.as_deref()
    }

    pub fn exit_hook(&self) -> Option<&str> {
        self.exit_hook.as_deref()
    }

    /// Distance from the root; top-level states have depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_id_is_zero() {
        assert_eq!(NodeId::ROOT.index(), 0);
        assert!(NodeId::ROOT.is_root());
        assert!(!NodeId(3).is_root());
    }

    #[test]
    fn node_ids_order_by_declaration() {
        assert!(NodeId(1) < NodeId(2));
        assert_eq!(NodeId(7).to_string(), "#7");
    }

    #[test]
    fn kind_defaults_to_leaf() {
        assert_eq!(StateKind::default(), StateKind::Leaf);
    }

    #[test]
    fn kind_serializes_in_snake_case() {
        let json = serde_json::to_string(&StateKind::Sequential).unwrap();
        assert_eq!(json, "\"sequential\"");
        assert_eq!(StateKind::Parallel.to_string(), "parallel");
    }
}
