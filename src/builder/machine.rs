//! Compiling a [`Definition`] into a shareable [`CompiledMachine`].
//!
//! Validation runs over the whole definition and accumulates every problem
//! with `stillwater::Validation` before anything is built, so a definition
//! either compiles completely or fails with the full list of problems.

use crate::builder::definition::{Definition, StateDef};
use crate::builder::error::DefinitionError;
use crate::core::{
    NodeId, StateKind, StateNode, StateTree, Transition, TransitionTable, UnknownState, ROOT_NAME,
};
use crate::engine::TransitionEngine;
use std::collections::{BTreeSet, HashMap};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

type Check = Validation<(), NonEmptyVec<DefinitionError>>;

/// Immutable product of [`build`]: the state tree and its transition table.
///
/// A compiled machine holds no per-instance state. Wrap it in an `Arc` and
/// hand it to as many [`Machine`](crate::machine::Machine)s as needed, on
/// any thread.
#[derive(Clone, Debug)]
pub struct CompiledMachine {
    tree: StateTree,
    table: TransitionTable,
}

impl CompiledMachine {
    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Planner over this tree and table.
    pub fn engine(&self) -> TransitionEngine<'_> {
        TransitionEngine::new(&self.tree, &self.table)
    }

    /// The top-level state entered when a machine starts.
    pub fn initial_state(&self) -> &str {
        self.tree
            .root()
            .initial()
            .map(|id| self.tree.name(id))
            .unwrap_or(ROOT_NAME)
    }

    /// Every entry, exit and action hook id referenced by the definition.
    pub fn hook_ids(&self) -> BTreeSet<&str> {
        let state_hooks = self
            .tree
            .states()
            .flat_map(|node| node.entry_hook().into_iter().chain(node.exit_hook()));
        let actions = self.table.iter().filter_map(Transition::action);
        state_hooks.chain(actions).collect()
    }

    /// Every guard id referenced by the definition.
    pub fn guard_ids(&self) -> BTreeSet<&str> {
        self.table.iter().filter_map(Transition::guard).collect()
    }
}

/// Validate `definition` and compile it.
///
/// # Errors
///
/// Returns every problem found in the definition; see [`DefinitionError`].
///
/// # Example
///
/// ```rust
/// use statecraft::builder::{build, Definition, DefinitionError, StateDef};
///
/// let definition = Definition::new("S")
///     .state(StateDef::sequential("S"))
///     .state(StateDef::leaf("S_1").parent("S"))
///     .state(StateDef::leaf("S_1").parent("Missing"));
///
/// let error = build(&definition).unwrap_err();
/// assert!(matches!(error, DefinitionError::Multiple(_)));
/// assert_eq!(error.problems().len(), 3);
/// ```
pub fn build(definition: &Definition) -> Result<CompiledMachine, DefinitionError> {
    let index = name_index(&definition.states);
    let layout = Layout::new(definition, &index);

    let mut checks: Vec<Check> = Vec::new();
    checks.extend(check_names(&definition.states));
    checks.extend(check_parents(definition, &index, &layout));
    checks.extend(check_initial_children(definition, &layout));
    checks.extend(check_initial_state(definition, &index, &layout));
    checks.extend(check_transitions(definition, &index));

    if let Validation::Failure(errors) = Validation::all_vec(checks) {
        let problems: Vec<DefinitionError> = errors.iter().cloned().collect();
        debug!(problems = problems.len(), "rejected state machine definition");
        return Err(DefinitionError::from_problems(problems));
    }

    let tree = build_tree(definition, &index, &layout);
    let table = build_table(definition, &tree)?;

    debug!(
        states = tree.len(),
        transitions = table.len(),
        initial = %definition.initial,
        "compiled state machine definition"
    );

    Ok(CompiledMachine { tree, table })
}

/// First declaration index of every state name.
fn name_index(states: &[StateDef]) -> HashMap<&str, usize> {
    let mut index = HashMap::new();
    for (position, state) in states.iter().enumerate() {
        index.entry(state.name.as_str()).or_insert(position);
    }
    index
}

/// Parent/child links resolved by declaration index. Unknown parents and
/// duplicate declarations are left out; the checks report them.
struct Layout {
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    top_level: Vec<usize>,
}

impl Layout {
    fn new(definition: &Definition, index: &HashMap<&str, usize>) -> Self {
        let count = definition.states.len();
        let mut parents = vec![None; count];
        let mut children = vec![Vec::new(); count];
        let mut top_level = Vec::new();

        for (position, state) in definition.states.iter().enumerate() {
            if index.get(state.name.as_str()) != Some(&position) {
                continue;
            }
            match &state.parent {
                None => top_level.push(position),
                Some(parent) => {
                    if let Some(&parent_position) = index.get(parent.as_str()) {
                        parents[position] = Some(parent_position);
                        children[parent_position].push(position);
                    }
                }
            }
        }

        Self {
            parents,
            children,
            top_level,
        }
    }

    /// Whether following parent links from `position` comes back to it.
    fn on_cycle(&self, position: usize) -> bool {
        let mut current = self.parents[position];
        for _ in 0..self.parents.len() {
            match current {
                Some(next) if next == position => return true,
                Some(next) => current = self.parents[next],
                None => return false,
            }
        }
        false
    }
}

fn check_names(states: &[StateDef]) -> Vec<Check> {
    let mut seen = BTreeSet::new();
    states
        .iter()
        .map(|state| {
            if state.name.is_empty() {
                Validation::fail(DefinitionError::EmptyStateName)
            } else if state.name == ROOT_NAME {
                Validation::fail(DefinitionError::ReservedStateName(state.name.clone()))
            } else if !seen.insert(state.name.as_str()) {
                Validation::fail(DefinitionError::DuplicateState(state.name.clone()))
            } else {
                Validation::success(())
            }
        })
        .collect()
}

fn check_parents(
    definition: &Definition,
    index: &HashMap<&str, usize>,
    layout: &Layout,
) -> Vec<Check> {
    let mut checks = Vec::new();

    for (position, state) in definition.states.iter().enumerate() {
        let Some(parent) = &state.parent else {
            continue;
        };
        match index.get(parent.as_str()) {
            None => checks.push(Validation::fail(DefinitionError::UnknownParent {
                state: state.name.clone(),
                parent: parent.clone(),
            })),
            Some(&parent_position) => {
                if definition.states[parent_position].kind == StateKind::Leaf {
                    checks.push(Validation::fail(DefinitionError::ChildOfLeaf {
                        state: parent.clone(),
                        child: state.name.clone(),
                    }));
                }
                if index.get(state.name.as_str()) == Some(&position) && layout.on_cycle(position) {
                    checks.push(Validation::fail(DefinitionError::ParentCycle {
                        state: state.name.clone(),
                    }));
                }
            }
        }
    }

    checks
}

/// Resolve the initial child of the composite at `position`, if it is
/// unambiguous.
fn initial_child_of(definition: &Definition, layout: &Layout, position: usize) -> Option<usize> {
    let named = definition.states[position].initial_child.as_deref();
    let candidates = initial_candidates(definition, &layout.children[position], named);
    match candidates.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Children flagged `initial` plus the child named by `named`, deduplicated,
/// in declaration order.
fn initial_candidates(
    definition: &Definition,
    children: &[usize],
    named: Option<&str>,
) -> Vec<usize> {
    children
        .iter()
        .copied()
        .filter(|&child| {
            let state = &definition.states[child];
            state.initial || named == Some(state.name.as_str())
        })
        .collect()
}

fn check_initial_children(definition: &Definition, layout: &Layout) -> Vec<Check> {
    let mut checks = Vec::new();

    for (position, state) in definition.states.iter().enumerate() {
        let children = &layout.children[position];
        let named = state.initial_child.as_deref();

        if let Some(child) = named {
            let is_child = children
                .iter()
                .any(|&c| definition.states[c].name == child);
            if !is_child && state.kind != StateKind::Parallel {
                checks.push(Validation::fail(DefinitionError::ForeignInitialChild {
                    state: state.name.clone(),
                    kind: state.kind,
                    child: child.to_string(),
                }));
            }
        }

        match state.kind {
            StateKind::Leaf => {}
            StateKind::Parallel => {
                let flagged = children
                    .iter()
                    .filter(|&&c| definition.states[c].initial)
                    .map(|&c| definition.states[c].name.as_str());
                for child in named.into_iter().chain(flagged) {
                    checks.push(Validation::fail(DefinitionError::ParallelInitialChild {
                        state: state.name.clone(),
                        child: child.to_string(),
                    }));
                }
            }
            StateKind::Sequential if children.is_empty() => {}
            StateKind::Sequential => {
                let candidates = initial_candidates(definition, children, named);
                match candidates.len() {
                    0 if named.is_none() => {
                        checks.push(Validation::fail(DefinitionError::MissingInitialChild {
                            state: state.name.clone(),
                        }))
                    }
                    0 | 1 => {}
                    _ => checks.push(Validation::fail(DefinitionError::MultipleInitialChildren {
                        state: state.name.clone(),
                        children: candidates
                            .iter()
                            .map(|&c| definition.states[c].name.clone())
                            .collect(),
                    })),
                }
            }
        }
    }

    checks
}

fn check_initial_state(
    definition: &Definition,
    index: &HashMap<&str, usize>,
    layout: &Layout,
) -> Vec<Check> {
    let flagged: Vec<&str> = layout
        .top_level
        .iter()
        .filter(|&&position| definition.states[position].initial)
        .map(|&position| definition.states[position].name.as_str())
        .filter(|&name| name != definition.initial)
        .collect();

    if definition.initial.is_empty() {
        return match flagged.as_slice() {
            [] => vec![Validation::fail(DefinitionError::MissingInitialState)],
            [_] => vec![Validation::success(())],
            many => vec![Validation::fail(DefinitionError::MultipleInitialChildren {
                state: ROOT_NAME.to_string(),
                children: many.iter().map(|name| name.to_string()).collect(),
            })],
        };
    }

    let mut checks = Vec::new();
    match index.get(definition.initial.as_str()) {
        None => checks.push(Validation::fail(DefinitionError::UnknownInitialState(
            definition.initial.clone(),
        ))),
        Some(&position) => {
            if let Some(parent) = &definition.states[position].parent {
                checks.push(Validation::fail(DefinitionError::NestedInitialState {
                    state: definition.initial.clone(),
                    parent: parent.clone(),
                }));
            }
        }
    }
    if !flagged.is_empty() {
        let children = std::iter::once(definition.initial.as_str())
            .chain(flagged)
            .map(str::to_string)
            .collect();
        checks.push(Validation::fail(DefinitionError::MultipleInitialChildren {
            state: ROOT_NAME.to_string(),
            children,
        }));
    }
    checks
}

fn check_transitions(definition: &Definition, index: &HashMap<&str, usize>) -> Vec<Check> {
    let mut checks = Vec::new();

    for transition in &definition.transitions {
        if transition.event.is_empty() {
            checks.push(Validation::fail(DefinitionError::EmptyEvent {
                from: transition.source.clone(),
            }));
        }
        if !index.contains_key(transition.source.as_str()) {
            checks.push(Validation::fail(DefinitionError::UnknownSource {
                state: transition.source.clone(),
                event: transition.event.clone(),
            }));
        }
        if let Some(target) = &transition.target {
            if !index.contains_key(target.as_str()) {
                checks.push(Validation::fail(DefinitionError::UnknownTarget {
                    from: transition.source.clone(),
                    event: transition.event.clone(),
                    target: target.clone(),
                }));
            }
        }
    }

    checks
}

/// Initial top-level state, from the definition or the single flagged one.
fn root_initial(
    definition: &Definition,
    index: &HashMap<&str, usize>,
    layout: &Layout,
) -> Option<usize> {
    if definition.initial.is_empty() {
        layout
            .top_level
            .iter()
            .copied()
            .find(|&position| definition.states[position].initial)
    } else {
        index.get(definition.initial.as_str()).copied()
    }
}

fn build_tree(
    definition: &Definition,
    index: &HashMap<&str, usize>,
    layout: &Layout,
) -> StateTree {
    let to_id = |position: usize| NodeId(position + 1);

    let mut nodes = Vec::with_capacity(definition.states.len() + 1);
    nodes.push(StateNode {
        id: NodeId::ROOT,
        name: ROOT_NAME.to_string(),
        kind: StateKind::Sequential,
        parent: None,
        children: layout.top_level.iter().copied().map(to_id).collect(),
        initial: root_initial(definition, index, layout).map(to_id),
        entry_hook: None,
        exit_hook: None,
        depth: 0,
    });

    for (position, state) in definition.states.iter().enumerate() {
        let depth =
            std::iter::successors(layout.parents[position], |&p| layout.parents[p]).count() + 1;
        let initial = match state.kind {
            StateKind::Sequential => initial_child_of(definition, layout, position).map(to_id),
            StateKind::Leaf | StateKind::Parallel => None,
        };
        nodes.push(StateNode {
            id: to_id(position),
            name: state.name.clone(),
            kind: state.kind,
            parent: Some(layout.parents[position].map(to_id).unwrap_or(NodeId::ROOT)),
            children: layout.children[position].iter().copied().map(to_id).collect(),
            initial,
            entry_hook: state.entry.clone(),
            exit_hook: state.exit.clone(),
            depth,
        });
    }

    StateTree::from_nodes(nodes)
}

fn build_table(
    definition: &Definition,
    tree: &StateTree,
) -> Result<TransitionTable, DefinitionError> {
    let transitions = definition
        .transitions
        .iter()
        .enumerate()
        .map(|(order, def)| {
            let source = tree
                .resolve(&def.source)
                .map_err(|e| unresolved(def.source.as_str(), def.event.as_str(), e))?;
            let target = def
                .target
                .as_deref()
                .map(|target| tree.resolve(target))
                .transpose()
                .map_err(|e| unresolved(def.source.as_str(), def.event.as_str(), e))?;
            Ok(Transition {
                source,
                event: def.event.clone(),
                target,
                action: def.action.clone(),
                guard: def.guard.clone(),
                order,
            })
        })
        .collect::<Result<Vec<_>, DefinitionError>>()?;

    Ok(TransitionTable::from_transitions(transitions))
}

fn unresolved(from: &str, event: &str, UnknownState(name): UnknownState) -> DefinitionError {
    if name == from {
        DefinitionError::UnknownSource {
            state: name,
            event: event.to_string(),
        }
    } else {
        DefinitionError::UnknownTarget {
            from: from.to_string(),
            event: event.to_string(),
            target: name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{StateDef, TransitionDef};

    fn base() -> Definition {
        Definition::new("A")
            .state(StateDef::leaf("A"))
            .state(StateDef::parallel("P").entry("genericEntry").exit("genericExit"))
            .state(StateDef::sequential("P_1").parent("P").initial_child("X"))
            .state(StateDef::leaf("X").parent("P_1"))
            .state(StateDef::leaf("Y").parent("P_1"))
            .state(StateDef::leaf("P_2").parent("P"))
            .transition(TransitionDef::new("A", "ToP").to("P").action("log"))
    }

    fn problems(definition: &Definition) -> Vec<DefinitionError> {
        build(definition)
            .unwrap_err()
            .problems()
            .into_iter()
            .cloned()
            .collect()
    }

    #[test]
    fn valid_definition_compiles() {
        let compiled = build(&base()).unwrap();
        let tree = compiled.tree();

        assert_eq!(tree.len(), 6);
        assert_eq!(compiled.initial_state(), "A");
        assert_eq!(compiled.table().len(), 1);

        let p_1 = tree.node(tree.resolve("P_1").unwrap());
        assert_eq!(p_1.depth(), 2);
        assert_eq!(p_1.initial(), tree.lookup("X"));
        assert_eq!(tree.node(tree.resolve("P").unwrap()).children().len(), 2);
    }

    #[test]
    fn node_ids_follow_declaration_order() {
        let compiled = build(&base()).unwrap();
        let names: Vec<_> = compiled.tree().states().map(|n| n.name().to_string()).collect();
        assert_eq!(names, vec!["A", "P", "P_1", "X", "Y", "P_2"]);
    }

    #[test]
    fn hook_ids_collects_every_reference() {
        let compiled = build(&base()).unwrap();
        let ids: Vec<_> = compiled.hook_ids().into_iter().collect();
        assert_eq!(ids, vec!["genericEntry", "genericExit", "log"]);
        assert!(compiled.guard_ids().is_empty());
    }

    #[test]
    fn children_may_be_declared_before_parent() {
        let definition = Definition::new("S")
            .state(StateDef::leaf("S_1").parent("S").initial())
            .state(StateDef::sequential("S"));

        let compiled = build(&definition).unwrap();
        let s = compiled.tree().resolve("S").unwrap();
        assert_eq!(compiled.tree().node(s).initial(), compiled.tree().lookup("S_1"));
        assert_eq!(compiled.tree().node(compiled.tree().resolve("S_1").unwrap()).depth(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let definition = base().state(StateDef::leaf("A"));
        assert_eq!(
            problems(&definition),
            vec![DefinitionError::DuplicateState("A".to_string())]
        );
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let definition = base().state(StateDef::leaf("Z").parent("Nowhere"));
        assert_eq!(
            problems(&definition),
            vec![DefinitionError::UnknownParent {
                state: "Z".to_string(),
                parent: "Nowhere".to_string(),
            }]
        );
    }

    #[test]
    fn sequential_without_initial_child_is_rejected() {
        let definition = Definition::new("S")
            .state(StateDef::sequential("S"))
            .state(StateDef::leaf("S_1").parent("S"))
            .state(StateDef::leaf("S_2").parent("S"));

        assert_eq!(
            problems(&definition),
            vec![DefinitionError::MissingInitialChild {
                state: "S".to_string()
            }]
        );
    }

    #[test]
    fn sequential_with_two_initial_children_is_rejected() {
        let definition = Definition::new("S")
            .state(StateDef::sequential("S").initial_child("S_1"))
            .state(StateDef::leaf("S_1").parent("S"))
            .state(StateDef::leaf("S_2").parent("S").initial());

        assert_eq!(
            problems(&definition),
            vec![DefinitionError::MultipleInitialChildren {
                state: "S".to_string(),
                children: vec!["S_1".to_string(), "S_2".to_string()],
            }]
        );
    }

    #[test]
    fn parallel_initial_child_is_rejected() {
        let definition = Definition::new("P")
            .state(StateDef::parallel("P"))
            .state(StateDef::leaf("R_1").parent("P").initial())
            .state(StateDef::leaf("R_2").parent("P"));

        assert_eq!(
            problems(&definition),
            vec![DefinitionError::ParallelInitialChild {
                state: "P".to_string(),
                child: "R_1".to_string(),
            }]
        );
    }

    #[test]
    fn initial_child_must_be_a_direct_child() {
        let definition = base().state(StateDef::sequential("S").initial_child("X"));
        assert_eq!(
            problems(&definition),
            vec![DefinitionError::ForeignInitialChild {
                state: "S".to_string(),
                kind: StateKind::Sequential,
                child: "X".to_string(),
            }]
        );
    }

    #[test]
    fn leaf_cannot_own_children() {
        let definition = base().state(StateDef::leaf("Inner").parent("A"));
        assert_eq!(
            problems(&definition),
            vec![DefinitionError::ChildOfLeaf {
                state: "A".to_string(),
                child: "Inner".to_string(),
            }]
        );
    }

    #[test]
    fn parent_cycles_are_rejected() {
        let definition = base()
            .state(StateDef::sequential("C_1").parent("C_2").initial())
            .state(StateDef::sequential("C_2").parent("C_1").initial());

        let found = problems(&definition);
        assert!(found.contains(&DefinitionError::ParentCycle {
            state: "C_1".to_string()
        }));
        assert!(found.contains(&DefinitionError::ParentCycle {
            state: "C_2".to_string()
        }));
    }

    #[test]
    fn transitions_must_reference_declared_states() {
        let definition = base()
            .transition(TransitionDef::new("Ghost", "Go").to("A"))
            .transition(TransitionDef::new("A", "Go").to("Phantom"));

        assert_eq!(
            problems(&definition),
            vec![
                DefinitionError::UnknownSource {
                    state: "Ghost".to_string(),
                    event: "Go".to_string(),
                },
                DefinitionError::UnknownTarget {
                    from: "A".to_string(),
                    event: "Go".to_string(),
                    target: "Phantom".to_string(),
                },
            ]
        );
    }

    #[test]
    fn initial_state_must_exist_and_be_top_level() {
        let mut definition = base();
        definition.initial = "Missing".to_string();
        assert_eq!(
            problems(&definition),
            vec![DefinitionError::UnknownInitialState("Missing".to_string())]
        );

        definition.initial = "X".to_string();
        assert_eq!(
            problems(&definition),
            vec![DefinitionError::NestedInitialState {
                state: "X".to_string(),
                parent: "P_1".to_string(),
            }]
        );
    }

    #[test]
    fn flagged_top_level_state_can_stand_in_for_initial() {
        let mut definition = base();
        definition.initial.clear();
        definition.states[1].initial = true;

        let compiled = build(&definition).unwrap();
        assert_eq!(compiled.initial_state(), "P");
    }

    #[test]
    fn missing_initial_state_is_rejected() {
        let mut definition = base();
        definition.initial.clear();
        assert_eq!(problems(&definition), vec![DefinitionError::MissingInitialState]);
    }

    #[test]
    fn every_problem_is_reported() {
        let definition = base()
            .state(StateDef::leaf(""))
            .state(StateDef::leaf("Z").parent("Nowhere"))
            .transition(TransitionDef::new("A", "").to("B"));

        let error = build(&definition).unwrap_err();
        assert!(matches!(error, DefinitionError::Multiple(_)));
        assert_eq!(error.problems().len(), 4);
    }
}
