//! Compiled transitions and the table that indexes them.

use super::state::NodeId;
use std::collections::HashMap;

/// A compiled transition between two states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub(crate) source: NodeId,
    pub(crate) event: String,
    pub(crate) target: Option<NodeId>,
    pub(crate) action: Option<String>,
    pub(crate) guard: Option<String>,
    pub(crate) order: usize,
}

impl Transition {
    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Target state; `None` for an internal transition that only runs its
    /// action.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }

    /// Position of the transition in its definition.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn is_internal(&self) -> bool {
        self.target.is_none()
    }
}

/// Transitions indexed by source state, then event tag.
///
/// Candidates sharing a (source, event) key keep their declaration order.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    by_source: HashMap<NodeId, HashMap<String, Vec<Transition>>>,
    len: usize,
}

impl TransitionTable {
    pub(crate) fn from_transitions(transitions: Vec<Transition>) -> Self {
        let len = transitions.len();
        let mut by_source: HashMap<NodeId, HashMap<String, Vec<Transition>>> = HashMap::new();
        for transition in transitions {
            by_source
                .entry(transition.source)
                .or_default()
                .entry(transition.event.clone())
                .or_default()
                .push(transition);
        }
        Self { by_source, len }
    }

    /// Transitions leaving `source` on `event`, in declaration order.
    pub fn candidates(&self, source: NodeId, event: &str) -> &[Transition] {
        self.by_source
            .get(&source)
            .and_then(|events| events.get(event))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `source` declares any transition on `event`.
    pub fn handles(&self, source: NodeId, event: &str) -> bool {
        !self.candidates(source, event).is_empty()
    }

    /// Every transition, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let mut all: Vec<&Transition> = self
            .by_source
            .values()
            .flat_map(|events| events.values().flatten())
            .collect();
        all.sort_by_key(|transition| transition.order);
        all.into_iter()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(source: usize, event: &str, target: Option<usize>, order: usize) -> Transition {
        Transition {
            source: NodeId(source),
            event: event.to_string(),
            target: target.map(NodeId),
            action: None,
            guard: None,
            order,
        }
    }

    #[test]
    fn candidates_keep_declaration_order() {
        let table = TransitionTable::from_transitions(vec![
            transition(1, "Go", Some(2), 0),
            transition(1, "Go", Some(3), 1),
            transition(2, "Go", Some(1), 2),
        ]);

        let targets: Vec<_> = table
            .candidates(NodeId(1), "Go")
            .iter()
            .map(|t| t.target())
            .collect();

        assert_eq!(targets, vec![Some(NodeId(2)), Some(NodeId(3))]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn missing_keys_yield_no_candidates() {
        let table = TransitionTable::from_transitions(vec![transition(1, "Go", None, 0)]);

        assert!(table.candidates(NodeId(1), "Stop").is_empty());
        assert!(table.candidates(NodeId(9), "Go").is_empty());
        assert!(table.handles(NodeId(1), "Go"));
        assert!(table.candidates(NodeId(1), "Go")[0].is_internal());
    }

    #[test]
    fn iter_walks_in_declaration_order() {
        let table = TransitionTable::from_transitions(vec![
            transition(3, "A", None, 0),
            transition(1, "B", None, 1),
            transition(2, "C", None, 2),
        ]);

        let events: Vec<_> = table.iter().map(|t| t.event().to_string()).collect();
        assert_eq!(events, vec!["A", "B", "C"]);
    }
}
