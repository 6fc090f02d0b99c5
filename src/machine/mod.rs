//! Running machine instances.
//!
//! A [`Machine`] pairs a shared [`CompiledMachine`](crate::builder::CompiledMachine)
//! with its own active configuration, hook registry and history. Events go
//! in through [`Machine::fire`]; everything else is a read-only query.

mod dispatcher;
mod error;
mod hooks;
mod options;
mod outcome;
pub mod query;

pub use dispatcher::{Machine, MachineStatus};
pub use error::{FireError, MachineError};
pub use hooks::HookRegistry;
pub use options::MachineOptions;
pub use outcome::{Outcome, TransitionSummary};
pub use query::sub_states_on;
