//! Transition planning.
//!
//! The engine is pure: it reads a tree, a table and a configuration and
//! returns what a transition would do. Nothing runs and nothing mutates
//! until the dispatcher commits a plan.

use crate::core::{NodeId, StateKind, StateTree, Transition, TransitionTable};
use crate::engine::config::{ActiveConfiguration, InvariantViolation};
use std::cmp::Reverse;
use tracing::trace;

/// Everything a matched transition will do, computed up front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub(crate) transition: Transition,
    pub(crate) domain: Option<NodeId>,
    pub(crate) exits: Vec<NodeId>,
    pub(crate) entries: Vec<NodeId>,
    pub(crate) next: ActiveConfiguration,
}

impl Plan {
    /// The transition that matched.
    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    /// The node every exit and entry lies below; `None` for internal
    /// transitions.
    pub fn domain(&self) -> Option<NodeId> {
        self.domain
    }

    /// States to exit, deepest first.
    pub fn exits(&self) -> &[NodeId] {
        &self.exits
    }

    /// States to enter, shallowest first.
    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    /// Configuration once the plan is applied.
    pub fn next(&self) -> &ActiveConfiguration {
        &self.next
    }

    pub fn is_internal(&self) -> bool {
        self.transition.is_internal()
    }
}

/// Pure planner over a shared tree and transition table.
#[derive(Clone, Copy, Debug)]
pub struct TransitionEngine<'a> {
    tree: &'a StateTree,
    table: &'a TransitionTable,
}

impl<'a> TransitionEngine<'a> {
    pub fn new(tree: &'a StateTree, table: &'a TransitionTable) -> Self {
        Self { tree, table }
    }

    /// Configuration reached by entering the root with default expansion:
    /// sequential states enter their initial child, parallel states enter
    /// every child.
    pub fn initial_configuration(&self) -> ActiveConfiguration {
        let mut config = ActiveConfiguration::new();
        self.enter_default(NodeId::ROOT, &mut config);
        config
    }

    /// First transition on `event` reachable from the active states.
    ///
    /// Active states are searched deepest first (ties in declaration order),
    /// so a state's transition shadows any ancestor's transition on the same
    /// event. Among a state's candidates the first one `accept` allows wins.
    pub fn find_match<F>(
        &self,
        active: &ActiveConfiguration,
        event: &str,
        mut accept: F,
    ) -> Option<&'a Transition>
    where
        F: FnMut(&Transition) -> bool,
    {
        let mut search: Vec<NodeId> = active.iter().collect();
        search.sort_by_key(|&id| (Reverse(self.tree.node(id).depth()), id));

        let table = self.table;
        search
            .into_iter()
            .flat_map(|id| table.candidates(id, event))
            .find(|transition| accept(transition))
    }

    /// Plan the transition `event` triggers, if any.
    ///
    /// Returns `Ok(None)` when no active state handles the event.
    ///
    /// # Errors
    ///
    /// Fails with [`InvariantViolation`] if the computed configuration would
    /// break a composite invariant. That is an engine defect, never a
    /// property of the definition.
    pub fn plan<F>(
        &self,
        active: &ActiveConfiguration,
        event: &str,
        accept: F,
    ) -> Result<Option<Plan>, InvariantViolation>
    where
        F: FnMut(&Transition) -> bool,
    {
        let Some(transition) = self.find_match(active, event, accept) else {
            trace!(event, "no active state handles event");
            return Ok(None);
        };

        let Some(target) = transition.target() else {
            return Ok(Some(Plan {
                transition: transition.clone(),
                domain: None,
                exits: Vec::new(),
                entries: Vec::new(),
                next: active.clone(),
            }));
        };

        let source = transition.source();
        let (domain, mut exits) = if self.tree.is_ancestor_or_self(target, source) {
            // Re-entering the source or one of its ancestors: the target
            // itself exits and enters again, siblings stay put.
            let domain = self.tree.node(target).parent().unwrap_or(NodeId::ROOT);
            let exits = active
                .iter()
                .filter(|&id| self.tree.is_ancestor_or_self(target, id))
                .collect::<Vec<_>>();
            (domain, exits)
        } else {
            let domain = self.tree.lca(source, target);
            let exits = active
                .iter()
                .filter(|&id| self.tree.is_strict_descendant(id, domain))
                .collect::<Vec<_>>();
            (domain, exits)
        };

        let mut remaining = active.clone();
        for &id in &exits {
            remaining.remove(id);
        }

        let mut reached = remaining.clone();
        for id in self.tree.path_from(domain, target) {
            reached.insert(id);
        }
        self.enter_default(target, &mut reached);
        self.complete(domain, &mut reached);

        exits.sort_by_key(|&id| (Reverse(self.tree.node(id).depth()), id));
        let mut entries: Vec<NodeId> = reached
            .iter()
            .filter(|&id| !remaining.contains(id))
            .collect();
        entries.sort_by_key(|&id| (self.tree.node(id).depth(), id));

        let mut plan = Plan {
            transition: transition.clone(),
            domain: Some(domain),
            exits,
            entries,
            next: ActiveConfiguration::new(),
        };
        plan.next = self.apply(&plan, active)?;

        trace!(
            event,
            from = self.tree.name(source),
            to = self.tree.name(target),
            exits = plan.exits.len(),
            entries = plan.entries.len(),
            "planned transition"
        );
        Ok(Some(plan))
    }

    /// Apply `plan` to `active`: drop the exits, add the entries and verify
    /// the result.
    ///
    /// # Errors
    ///
    /// Fails with [`InvariantViolation`] if the result breaks a composite
    /// invariant.
    pub fn apply(
        &self,
        plan: &Plan,
        active: &ActiveConfiguration,
    ) -> Result<ActiveConfiguration, InvariantViolation> {
        let mut next = active.clone();
        for &id in &plan.exits {
            next.remove(id);
        }
        for &id in &plan.entries {
            next.insert(id);
        }
        next.verify(self.tree)?;
        Ok(next)
    }

    /// Enter `id` and its default descendants.
    fn enter_default(&self, id: NodeId, config: &mut ActiveConfiguration) {
        config.insert(id);
        let node = self.tree.node(id);
        match node.kind() {
            StateKind::Leaf => {}
            StateKind::Sequential => {
                if let Some(initial) = node.initial() {
                    self.enter_default(initial, config);
                }
            }
            StateKind::Parallel => {
                for &child in node.children() {
                    self.enter_default(child, config);
                }
            }
        }
    }

    /// Fill in whatever below `id` an exit left empty: regions of active
    /// parallel states and children of active sequential states.
    fn complete(&self, id: NodeId, config: &mut ActiveConfiguration) {
        let node = self.tree.node(id);
        match node.kind() {
            StateKind::Leaf => {}
            StateKind::Sequential => {
                match node.children().iter().copied().find(|&c| config.contains(c)) {
                    Some(child) => self.complete(child, config),
                    None => {
                        if let Some(initial) = node.initial() {
                            self.enter_default(initial, config);
                        }
                    }
                }
            }
            StateKind::Parallel => {
                for &child in node.children() {
                    if config.contains(child) {
                        self.complete(child, config);
                    } else {
                        self.enter_default(child, config);
                    }
                }
            }
        }
    }
}
