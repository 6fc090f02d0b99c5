//! Arguments handed to hooks and guards.

use std::fmt;

/// Which part of a transition a hook runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Evaluating a guard while searching for a transition.
    Guard,
    /// A state's exit hook.
    Exit,
    /// The transition's own action.
    Action,
    /// A state's entry hook.
    Entry,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Guard => "guard",
            Self::Exit => "exit",
            Self::Action => "action",
            Self::Entry => "entry",
        };
        f.write_str(name)
    }
}

/// Everything a hook learns about the call it is part of.
///
/// `from` and `to` always name the transition's source and target (an
/// internal transition has `to == from`); `state` names the state whose
/// hook is running. The caller's context is passed through untouched.
#[derive(Debug)]
pub struct HookContext<'a, C> {
    pub phase: HookPhase,
    pub state: &'a str,
    pub from: &'a str,
    pub to: &'a str,
    pub event: &'a str,
    pub context: &'a C,
}

impl<C> Clone for HookContext<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for HookContext<'_, C> {}

impl<'a, C> HookContext<'a, C> {
    /// Same call, different phase and state.
    pub(crate) fn at(self, phase: HookPhase, state: &'a str) -> Self {
        Self {
            phase,
            state,
            ..self
        }
    }
}
