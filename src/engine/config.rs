//! The set of states active in one machine instance.

use crate::core::{NodeId, StateKind, StateTree, ROOT_NAME};
use std::collections::BTreeSet;
use thiserror::Error;

/// A composite invariant broken by a configuration.
///
/// The engine only ever produces configurations that satisfy every
/// invariant, so seeing one of these means the engine has a bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("State '{state}' is active but its parent '{parent}' is not")]
    InactiveParent { state: String, parent: String },

    #[error("Sequential state '{state}' has {} active children: {active:?}", .active.len())]
    SequentialChildren { state: String, active: Vec<String> },

    #[error("Parallel state '{state}' is missing active regions: {missing:?}")]
    IncompleteParallel { state: String, missing: Vec<String> },
}

/// Active states of one machine instance.
///
/// The implicit root is always active and never stored. Ids iterate in
/// declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ActiveConfiguration {
    active: BTreeSet<NodeId>,
}

impl ActiveConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.is_root() || self.active.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active state ids in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.active.iter().copied()
    }

    pub(crate) fn insert(&mut self, id: NodeId) {
        if !id.is_root() {
            self.active.insert(id);
        }
    }

    pub(crate) fn remove(&mut self, id: NodeId) {
        self.active.remove(&id);
    }

    /// Active ids ordered by depth, then declaration order.
    pub fn by_depth(&self, tree: &StateTree) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.iter().collect();
        ids.sort_by_key(|&id| (tree.node(id).depth(), id));
        ids
    }

    /// Names of the active states ordered by depth, then declaration order.
    pub fn names(&self, tree: &StateTree) -> Vec<String> {
        self.by_depth(tree)
            .into_iter()
            .map(|id| tree.name(id).to_string())
            .collect()
    }

    /// Active states none of whose children are active.
    pub fn leaves(&self, tree: &StateTree) -> BTreeSet<String> {
        self.iter()
            .filter(|&id| !tree.node(id).children().iter().any(|&c| self.contains(c)))
            .map(|id| tree.name(id).to_string())
            .collect()
    }

    /// Check every composite invariant against `tree`.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant, looking at the root first and
    /// then at states in declaration order.
    pub fn verify(&self, tree: &StateTree) -> Result<(), InvariantViolation> {
        self.verify_node(tree, NodeId::ROOT)?;
        for id in self.iter() {
            let node = tree.node(id);
            let parent = node.parent().unwrap_or(NodeId::ROOT);
            if !self.contains(parent) {
                return Err(InvariantViolation::InactiveParent {
                    state: node.name().to_string(),
                    parent: tree.name(parent).to_string(),
                });
            }
            self.verify_node(tree, id)?;
        }
        Ok(())
    }

    fn verify_node(&self, tree: &StateTree, id: NodeId) -> Result<(), InvariantViolation> {
        let node = tree.node(id);
        let name = if id.is_root() { ROOT_NAME } else { node.name() };
        match node.kind() {
            StateKind::Leaf => Ok(()),
            StateKind::Sequential => {
                let active: Vec<String> = node
                    .children()
                    .iter()
                    .filter(|&&c| self.contains(c))
                    .map(|&c| tree.name(c).to_string())
                    .collect();
                if node.children().is_empty() || active.len() == 1 {
                    Ok(())
                } else {
                    Err(InvariantViolation::SequentialChildren {
                        state: name.to_string(),
                        active,
                    })
                }
            }
            StateKind::Parallel => {
                let missing: Vec<String> = node
                    .children()
                    .iter()
                    .filter(|&&c| !self.contains(c))
                    .map(|&c| tree.name(c).to_string())
                    .collect();
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(InvariantViolation::IncompleteParallel {
                        state: name.to_string(),
                        missing,
                    })
                }
            }
        }
    }
}

impl FromIterator<NodeId> for ActiveConfiguration {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut config = Self::new();
        for id in iter {
            config.insert(id);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Definition, StateDef};

    fn tree() -> StateTree {
        Definition::new("A")
            .state(StateDef::leaf("A"))
            .state(StateDef::parallel("P"))
            .state(StateDef::sequential("R_1").parent("P").initial_child("X"))
            .state(StateDef::leaf("X").parent("R_1"))
            .state(StateDef::leaf("Y").parent("R_1"))
            .state(StateDef::leaf("R_2").parent("P"))
            .compile()
            .unwrap()
            .tree()
            .clone()
    }

    fn config(tree: &StateTree, names: &[&str]) -> ActiveConfiguration {
        names.iter().map(|name| tree.resolve(name).unwrap()).collect()
    }

    #[test]
    fn valid_configuration_verifies() {
        let tree = tree();
        assert_eq!(config(&tree, &["A"]).verify(&tree), Ok(()));
        assert_eq!(config(&tree, &["P", "R_1", "X", "R_2"]).verify(&tree), Ok(()));
    }

    #[test]
    fn orphaned_state_is_a_violation() {
        let tree = tree();
        let result = config(&tree, &["A", "X"]).verify(&tree);
        assert_eq!(
            result,
            Err(InvariantViolation::InactiveParent {
                state: "X".to_string(),
                parent: "R_1".to_string(),
            })
        );
    }

    #[test]
    fn two_active_sequential_children_is_a_violation() {
        let tree = tree();
        let result = config(&tree, &["P", "R_1", "X", "Y", "R_2"]).verify(&tree);
        assert!(matches!(
            result,
            Err(InvariantViolation::SequentialChildren { ref state, .. }) if state == "R_1"
        ));
    }

    #[test]
    fn empty_root_is_a_violation() {
        let tree = tree();
        let result = ActiveConfiguration::new().verify(&tree);
        assert_eq!(
            result,
            Err(InvariantViolation::SequentialChildren {
                state: ROOT_NAME.to_string(),
                active: vec![],
            })
        );
    }

    #[test]
    fn incomplete_parallel_is_a_violation() {
        let tree = tree();
        let result = config(&tree, &["P", "R_1", "X"]).verify(&tree);
        assert_eq!(
            result,
            Err(InvariantViolation::IncompleteParallel {
                state: "P".to_string(),
                missing: vec!["R_2".to_string()],
            })
        );
    }

    #[test]
    fn leaves_are_deepest_active_states() {
        let tree = tree();
        let leaves = config(&tree, &["P", "R_1", "X", "R_2"]).leaves(&tree);
        let expected: BTreeSet<String> = ["X", "R_2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(leaves, expected);
    }

    #[test]
    fn names_are_ordered_by_depth() {
        let tree = tree();
        let names = config(&tree, &["X", "R_2", "P", "R_1"]).names(&tree);
        assert_eq!(names, vec!["P", "R_1", "R_2", "X"]);
    }
}
