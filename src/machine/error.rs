//! Runtime errors of a machine instance.

use crate::engine::InvariantViolation;
use thiserror::Error;

/// Errors raised while constructing a [`Machine`](super::Machine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("Hook '{id}' is referenced by the definition but not registered")]
    UnregisteredHook { id: String },

    #[error("Guard '{id}' is referenced by the definition but not registered")]
    UnregisteredGuard { id: String },

    #[error("Initial configuration is invalid: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Errors raised by [`Machine::fire`](super::Machine::fire).
///
/// None of these change the active configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError {
    #[error("Event '{event}' fired while another event is being handled")]
    Reentrant { event: String },

    #[error("Event '{event}' fired into a terminated machine")]
    Terminated { event: String },

    #[error("Transition would break the active configuration: {0}")]
    Invariant(#[from] InvariantViolation),
}
