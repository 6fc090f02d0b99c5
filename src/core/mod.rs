//! Core state machine types.
//!
//! This module contains the immutable data shared by every machine built
//! from one definition:
//! - The state hierarchy (`StateTree` of `StateNode`s)
//! - Compiled transitions indexed by source and event
//! - Event tags, hook arguments and guard predicates
//! - Transition history records
//!
//! Nothing here mutates after construction except `TransitionHistory`,
//! which each machine owns privately.

mod event;
mod guard;
mod history;
mod hook;
mod state;
mod transition;
mod tree;

pub use event::Event;
pub use guard::Guard;
pub use history::{TransitionHistory, TransitionRecord, DEFAULT_HISTORY_LIMIT};
pub use hook::{HookContext, HookPhase};
pub use state::{NodeId, StateKind, StateNode};
pub use transition::{Transition, TransitionTable};
pub use tree::{Ancestors, StateTree, UnknownState, ROOT_NAME};
