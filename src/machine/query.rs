//! Read-only queries over an active configuration.

use crate::core::StateTree;
use crate::engine::ActiveConfiguration;

/// Active states strictly below `name`, shallowest first with ties in
/// declaration order.
///
/// Unknown names and inactive states have no active substates, so both give
/// an empty list.
pub fn sub_states_on(tree: &StateTree, active: &ActiveConfiguration, name: &str) -> Vec<String> {
    let Some(id) = tree.lookup(name) else {
        return Vec::new();
    };
    if !active.contains(id) {
        return Vec::new();
    }
    active
        .by_depth(tree)
        .into_iter()
        .filter(|&node| tree.is_strict_descendant(node, id))
        .map(|node| tree.name(node).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CompiledMachine, Definition, StateDef};

    fn compiled() -> CompiledMachine {
        Definition::new("P")
            .state(StateDef::parallel("P"))
            .state(StateDef::sequential("R_1").parent("P").initial_child("X"))
            .state(StateDef::leaf("X").parent("R_1"))
            .state(StateDef::leaf("Y").parent("R_1"))
            .state(StateDef::leaf("R_2").parent("P"))
            .state(StateDef::leaf("Q"))
            .compile()
            .unwrap()
    }

    #[test]
    fn substates_are_ordered_by_depth() {
        let compiled = compiled();
        let active = compiled.engine().initial_configuration();

        assert_eq!(
            sub_states_on(compiled.tree(), &active, "P"),
            vec!["R_1", "R_2", "X"]
        );
        assert_eq!(sub_states_on(compiled.tree(), &active, "R_1"), vec!["X"]);
    }

    #[test]
    fn leaves_have_no_substates() {
        let compiled = compiled();
        let active = compiled.engine().initial_configuration();
        assert!(sub_states_on(compiled.tree(), &active, "X").is_empty());
    }

    #[test]
    fn unknown_and_inactive_states_have_no_substates() {
        let compiled = compiled();
        let active = compiled.engine().initial_configuration();

        assert!(sub_states_on(compiled.tree(), &active, "Nope").is_empty());
        assert!(sub_states_on(compiled.tree(), &active, "Q").is_empty());
        assert!(sub_states_on(compiled.tree(), &active, "Y").is_empty());
    }
}
