//! Builder API: from a raw definition to a compiled machine.
//!
//! A [`Definition`] lists states, parent links and transitions by name. The
//! [`build`] function validates it in one pass and produces a
//! [`CompiledMachine`], the immutable tree and transition table every
//! machine instance shares.

pub mod definition;
pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use definition::{Definition, StateDef};
pub use error::DefinitionError;
pub use machine::{build, CompiledMachine};
pub use transition::TransitionDef;
