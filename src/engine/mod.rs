//! Active configurations and transition planning.
//!
//! [`TransitionEngine`] answers "what would this event do?" without running
//! anything: it finds the matching transition, computes the exit and entry
//! sequences and the verified configuration that results. The
//! [`Machine`](crate::machine::Machine) decides when to run hooks and commit.

mod config;
mod plan;

pub use config::{ActiveConfiguration, InvariantViolation};
pub use plan::{Plan, TransitionEngine};
