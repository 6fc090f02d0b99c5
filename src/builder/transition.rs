//! Builder for transition declarations.

use serde::{Deserialize, Serialize};

/// Declaration of a transition, before validation.
///
/// A transition without a target is internal: its action runs and the
/// active configuration does not move.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionDef {
    pub source: String,
    pub event: String,
    pub target: Option<String>,
    pub action: Option<String>,
    pub guard: Option<String>,
}

impl TransitionDef {
    /// Create a transition leaving `source` on `event`.
    pub fn new(source: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            event: event.into(),
            ..Self::default()
        }
    }

    /// Set the target state (optional).
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the action hook id (optional).
    pub fn action(mut self, hook: impl Into<String>) -> Self {
        self.action = Some(hook.into());
        self
    }

    /// Add a guard id (optional).
    pub fn when(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluent_api_builds_transition() {
        let transition = TransitionDef::new("A", "ToB")
            .to("B")
            .action("fromAToB")
            .when("isReady");

        assert_eq!(transition.source, "A");
        assert_eq!(transition.event, "ToB");
        assert_eq!(transition.target.as_deref(), Some("B"));
        assert_eq!(transition.action.as_deref(), Some("fromAToB"));
        assert_eq!(transition.guard.as_deref(), Some("isReady"));
    }

    #[test]
    fn transition_without_target_is_internal() {
        let transition = TransitionDef::new("A", "Ping").action("log");
        assert!(transition.target.is_none());
    }
}
