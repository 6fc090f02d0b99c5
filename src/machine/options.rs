//! Per-instance configuration.

use crate::core::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

/// Options for a single [`Machine`](super::Machine).
///
/// Every field has a default, so options can be read from partial
/// configuration files.
///
/// # Example
///
/// ```rust
/// use statecraft::machine::MachineOptions;
///
/// let options: MachineOptions = serde_json::from_str(r#"{ "label": "door" }"#).unwrap();
/// assert_eq!(options.label.as_deref(), Some("door"));
/// assert_eq!(options.history_limit, statecraft::core::DEFAULT_HISTORY_LIMIT);
///
/// let quiet = MachineOptions::default().with_history_limit(0);
/// assert_eq!(quiet.history_limit, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineOptions {
    /// Name recorded in log spans alongside the instance id.
    pub label: Option<String>,
    /// Committed transitions kept in the history; `0` disables it.
    pub history_limit: usize,
    /// Log every hook call at `debug` instead of `trace`.
    pub trace_hooks: bool,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            label: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            trace_hooks: false,
        }
    }
}

impl MachineOptions {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_trace_hooks(mut self, enabled: bool) -> Self {
        self.trace_hooks = enabled;
        self
    }
}
