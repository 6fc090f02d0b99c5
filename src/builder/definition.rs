//! Raw, unvalidated machine definitions.
//!
//! A [`Definition`] is what a host hands to the builder: a flat list of
//! states with parent links, a list of transitions and the name of the
//! initial top-level state. The types derive `serde` traits so a host can
//! load them from whatever format it likes; nothing in this crate parses one.

use crate::builder::error::DefinitionError;
use crate::builder::machine::{build, CompiledMachine};
use crate::builder::transition::TransitionDef;
use crate::core::StateKind;
use serde::{Deserialize, Serialize};

/// Declaration of a single state.
///
/// The initial child of a sequential composite can be named on the
/// composite (`initial_child`) or flagged on the child (`initial`).
///
/// # Example
///
/// ```rust
/// use statecraft::builder::StateDef;
/// use statecraft::core::StateKind;
///
/// let state = StateDef::sequential("P_1_POWER_SAVING")
///     .parent("P_1")
///     .initial_child("P_1_POWER_SAVING_ACTIVE")
///     .entry("genericEntry")
///     .exit("genericExit");
///
/// assert_eq!(state.kind, StateKind::Sequential);
/// assert_eq!(state.parent.as_deref(), Some("P_1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDef {
    pub name: String,
    pub parent: Option<String>,
    pub kind: StateKind,
    pub initial_child: Option<String>,
    pub initial: bool,
    pub entry: Option<String>,
    pub exit: Option<String>,
}

impl StateDef {
    pub fn new(name: impl Into<String>, kind: StateKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn leaf(name: impl Into<String>) -> Self {
        Self::new(name, StateKind::Leaf)
    }

    pub fn sequential(name: impl Into<String>) -> Self {
        Self::new(name, StateKind::Sequential)
    }

    pub fn parallel(name: impl Into<String>) -> Self {
        Self::new(name, StateKind::Parallel)
    }

    /// Nest this state under `parent`.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Name the child entered by default (sequential composites only).
    pub fn initial_child(mut self, child: impl Into<String>) -> Self {
        self.initial_child = Some(child.into());
        self
    }

    /// Mark this state as its parent's initial child.
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    /// Hook id invoked when the state is entered.
    pub fn entry(mut self, hook: impl Into<String>) -> Self {
        self.entry = Some(hook.into());
        self
    }

    /// Hook id invoked when the state is exited.
    pub fn exit(mut self, hook: impl Into<String>) -> Self {
        self.exit = Some(hook.into());
        self
    }
}

/// Complete description of a machine, ready to be compiled.
///
/// # Example
///
/// ```rust
/// use statecraft::builder::{Definition, StateDef, TransitionDef};
///
/// let compiled = Definition::new("Idle")
///     .state(StateDef::leaf("Idle"))
///     .state(StateDef::leaf("Busy"))
///     .transition(TransitionDef::new("Idle", "Start").to("Busy"))
///     .compile()
///     .unwrap();
///
/// assert_eq!(compiled.tree().len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Definition {
    pub states: Vec<StateDef>,
    pub transitions: Vec<TransitionDef>,
    pub initial: String,
}

impl Definition {
    /// Start a definition whose initial top-level state is `initial`.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            initial: initial.into(),
            ..Self::default()
        }
    }

    pub fn state(mut self, state: StateDef) -> Self {
        self.states.push(state);
        self
    }

    pub fn states(mut self, states: impl IntoIterator<Item = StateDef>) -> Self {
        self.states.extend(states);
        self
    }

    pub fn transition(mut self, transition: TransitionDef) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn transitions(mut self, transitions: impl IntoIterator<Item = TransitionDef>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Validate and compile; see [`build`].
    pub fn compile(&self) -> Result<CompiledMachine, DefinitionError> {
        build(self)
    }
}
