//! Transition history tracking.
//!
//! Each machine keeps a bounded log of the transitions it committed, oldest
//! first. Events that matched nothing are not recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single committed transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Tag of the event that triggered the transition
    pub event: String,
    /// State that declared the transition
    pub source: String,
    /// Target state; `None` for internal transitions
    pub target: Option<String>,
    /// States exited, deepest first
    pub exited: Vec<String>,
    /// States entered, shallowest first
    pub entered: Vec<String>,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered log of committed transitions.
///
/// Once `limit` records are held, recording another drops the oldest. A
/// limit of zero disables recording.
///
/// # Example
///
/// ```rust
/// use statecraft::core::{TransitionHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = TransitionHistory::with_limit(2);
/// for event in ["ToB", "ToP", "ToS"] {
///     history.record(TransitionRecord {
///         event: event.to_string(),
///         source: "A".to_string(),
///         target: None,
///         exited: vec![],
///         entered: vec![],
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.events(), vec!["ToP", "ToS"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    limit: usize,
}

impl Default for TransitionHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

/// Records kept when no limit is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

impl TransitionHistory {
    /// Create an empty history keeping at most `limit` records.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit,
        }
    }

    /// Append a record, evicting the oldest one when full.
    pub fn record(&mut self, record: TransitionRecord) {
        if self.limit == 0 {
            return;
        }
        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    /// Event tags in the order they were committed.
    pub fn events(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.event.as_str()).collect()
    }

    /// Time between the first and last retained records.
    ///
    /// Returns `None` when the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.front(), self.records.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event: &str) -> TransitionRecord {
        TransitionRecord {
            event: event.to_string(),
            source: "A".to_string(),
            target: Some("B".to_string()),
            exited: vec!["A".to_string()],
            entered: vec!["B".to_string()],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = TransitionHistory::default();
        assert!(history.is_empty());
        assert!(history.last().is_none());
        assert!(history.duration().is_none());
        assert_eq!(history.limit(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn record_appends_in_order() {
        let mut history = TransitionHistory::default();
        history.record(record("ToB"));
        history.record(record("ToP"));

        assert_eq!(history.events(), vec!["ToB", "ToP"]);
        assert_eq!(history.last().map(|r| r.event.as_str()), Some("ToP"));
    }

    #[test]
    fn full_history_evicts_oldest() {
        let mut history = TransitionHistory::with_limit(2);
        history.record(record("one"));
        history.record(record("two"));
        history.record(record("three"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.events(), vec!["two", "three"]);
    }

    #[test]
    fn zero_limit_disables_recording() {
        let mut history = TransitionHistory::with_limit(0);
        history.record(record("ignored"));
        assert!(history.is_empty());
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = TransitionHistory::default();
        history.record(record("first"));

        std::thread::sleep(std::time::Duration::from_millis(10));

        history.record(record("second"));

        let duration = history.duration();
        assert!(duration.is_some());
        assert!(duration.unwrap() >= std::time::Duration::from_millis(10));
    }

    #[test]
    fn single_record_has_duration_zero() {
        let mut history = TransitionHistory::default();
        history.record(record("only"));
        assert_eq!(history.duration(), Some(std::time::Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = TransitionHistory::with_limit(4);
        history.record(record("ToB"));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: TransitionHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.len(), 1);
        assert_eq!(deserialized.limit(), 4);
        assert_eq!(deserialized.last(), history.last());
    }
}
