//! What a call to `fire` did.

use serde::Serialize;
use std::collections::BTreeSet;

/// Summary of a transition that changed the active configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransitionSummary {
    pub event: String,
    pub source: String,
    pub target: String,
    /// States exited, deepest first.
    pub exited: Vec<String>,
    /// States entered, shallowest first.
    pub entered: Vec<String>,
    /// Active leaves before the transition.
    pub previous: BTreeSet<String>,
    /// Active leaves after the transition.
    pub current: BTreeSet<String>,
}

/// Result of handling one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No active state handles the event; nothing ran.
    NoMatch { event: String },
    /// An internal transition ran its action; no state was exited or
    /// entered.
    Internal { source: String, event: String },
    /// States were exited and entered.
    Transitioned(TransitionSummary),
}

impl Outcome {
    /// Whether the active configuration is unchanged.
    pub fn is_noop(&self) -> bool {
        !matches!(self, Self::Transitioned(_))
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, Self::NoMatch { .. })
    }

    pub fn event(&self) -> &str {
        match self {
            Self::NoMatch { event } | Self::Internal { event, .. } => event,
            Self::Transitioned(summary) => &summary.event,
        }
    }

    pub fn summary(&self) -> Option<&TransitionSummary> {
        match self {
            Self::Transitioned(summary) => Some(summary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TransitionSummary {
        TransitionSummary {
            event: "ToB".to_string(),
            source: "A".to_string(),
            target: "B".to_string(),
            exited: vec!["A".to_string()],
            entered: vec!["B".to_string()],
            previous: ["A".to_string()].into(),
            current: ["B".to_string()].into(),
        }
    }

    #[test]
    fn only_transitions_change_configuration() {
        let no_match = Outcome::NoMatch {
            event: "Nope".to_string(),
        };
        let internal = Outcome::Internal {
            source: "A".to_string(),
            event: "Tick".to_string(),
        };

        assert!(no_match.is_noop());
        assert!(!no_match.is_match());
        assert!(internal.is_noop());
        assert!(internal.is_match());
        assert!(!Outcome::Transitioned(summary()).is_noop());
    }

    #[test]
    fn event_is_reported_for_every_outcome() {
        assert_eq!(Outcome::Transitioned(summary()).event(), "ToB");
        assert_eq!(
            Outcome::NoMatch {
                event: "X".to_string()
            }
            .event(),
            "X"
        );
    }

    #[test]
    fn outcomes_serialize_with_tag() {
        let json = serde_json::to_value(Outcome::NoMatch {
            event: "Nope".to_string(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "no_match");
        assert_eq!(json["event"], "Nope");

        let json = serde_json::to_value(Outcome::Transitioned(summary())).unwrap();
        assert_eq!(json["outcome"], "transitioned");
        assert_eq!(json["current"], serde_json::json!(["B"]));
    }
}
