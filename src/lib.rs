//! Statecraft: a hierarchical state machine runtime
//!
//! States nest. A sequential composite has exactly one active child, a
//! parallel composite has every child active as an independent region. A
//! definition is validated and compiled once into an immutable tree and
//! transition table, then shared by any number of machine instances.
//!
//! # Core Concepts
//!
//! - **Definition**: states, parent links and transitions by name
//! - **CompiledMachine**: the validated tree and table, `Send + Sync`
//! - **Machine**: one running instance with its own active configuration
//! - **Hooks**: entry, exit and action procedures looked up by id
//!
//! # Example
//!
//! ```rust
//! use statecraft::builder::{Definition, StateDef, TransitionDef};
//! use statecraft::core::HookContext;
//! use statecraft::machine::{HookRegistry, Machine};
//! use std::sync::Arc;
//!
//! let compiled = Definition::new("A")
//!     .state(StateDef::leaf("A"))
//!     .state(StateDef::parallel("P"))
//!     .state(StateDef::sequential("P_1").parent("P").initial_child("ON"))
//!     .state(StateDef::leaf("ON").parent("P_1").entry("announce"))
//!     .state(StateDef::leaf("OFF").parent("P_1"))
//!     .state(StateDef::leaf("P_2").parent("P"))
//!     .transition(TransitionDef::new("A", "ToP").to("P"))
//!     .transition(TransitionDef::new("ON", "Switch").to("OFF"))
//!     .compile()
//!     .unwrap();
//!
//! let hooks = HookRegistry::new()
//!     .register("announce", |ctx: &HookContext<'_, ()>| println!("entered {}", ctx.state));
//! let machine = Machine::with_defaults(Arc::new(compiled), hooks).unwrap();
//!
//! machine.fire("ToP", &()).unwrap();
//! assert_eq!(machine.sub_states_on("P"), vec!["P_1", "P_2", "ON"]);
//!
//! machine.fire("Switch", &()).unwrap();
//! assert!(machine.is_active("OFF"));
//! assert!(machine.is_active("P_2"));
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod machine;

// Re-export commonly used types
pub use builder::{build, CompiledMachine, Definition, DefinitionError, StateDef, TransitionDef};
pub use core::{Event, HookContext, HookPhase, StateKind};
pub use machine::{FireError, HookRegistry, Machine, MachineError, MachineOptions, Outcome};
