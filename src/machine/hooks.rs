//! Registry mapping hook and guard ids to procedures.

use crate::builder::CompiledMachine;
use crate::core::{Guard, HookContext};
use crate::machine::error::MachineError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

type Hook<C> = Box<dyn Fn(&HookContext<'_, C>) + Send>;

/// Entry, exit and action procedures plus guard predicates, keyed by the
/// ids a [`Definition`](crate::builder::Definition) refers to.
///
/// Hooks receive the caller's context by shared reference and return
/// nothing; any state they want to keep lives behind the context or their
/// own captures.
///
/// # Example
///
/// ```rust
/// use statecraft::core::HookContext;
/// use statecraft::machine::HookRegistry;
///
/// let hooks: HookRegistry<()> = HookRegistry::new()
///     .register("log", |ctx: &HookContext<'_, ()>| println!("{} {}", ctx.phase, ctx.state))
///     .guard("always", |_: &HookContext<'_, ()>| true);
///
/// assert!(hooks.contains("log"));
/// assert!(hooks.contains_guard("always"));
/// ```
pub struct HookRegistry<C> {
    hooks: HashMap<String, Hook<C>>,
    guards: HashMap<String, Guard<C>>,
}

impl<C> Default for HookRegistry<C> {
    fn default() -> Self {
        Self {
            hooks: HashMap::new(),
            guards: HashMap::new(),
        }
    }
}

impl<C> HookRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook under `id`, replacing any previous one.
    pub fn register<F>(mut self, id: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&HookContext<'_, C>) + Send + 'static,
    {
        self.insert(id, hook);
        self
    }

    /// Register a guard predicate under `id`, replacing any previous one.
    pub fn guard<F>(mut self, id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&HookContext<'_, C>) -> bool + Send + 'static,
    {
        self.insert_guard(id, predicate);
        self
    }

    pub fn insert<F>(&mut self, id: impl Into<String>, hook: F)
    where
        F: Fn(&HookContext<'_, C>) + Send + 'static,
    {
        self.hooks.insert(id.into(), Box::new(hook));
    }

    pub fn insert_guard<F>(&mut self, id: impl Into<String>, predicate: F)
    where
        F: Fn(&HookContext<'_, C>) -> bool + Send + 'static,
    {
        self.guards.insert(id.into(), Guard::new(predicate));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.hooks.contains_key(id)
    }

    pub fn contains_guard(&self, id: &str) -> bool {
        self.guards.contains_key(id)
    }

    /// Run the hook registered under `id`.
    ///
    /// Returns `false` when nothing is registered under `id`.
    pub fn invoke(&self, id: &str, ctx: &HookContext<'_, C>) -> bool {
        match self.hooks.get(id) {
            Some(hook) => {
                hook(ctx);
                true
            }
            None => false,
        }
    }

    /// Evaluate the guard registered under `id`. An unregistered guard
    /// rejects.
    pub fn check_guard(&self, id: &str, ctx: &HookContext<'_, C>) -> bool {
        self.guards.get(id).is_some_and(|guard| guard.check(ctx))
    }

    /// Make sure every id `compiled` refers to has a procedure.
    pub(crate) fn verify_against(&self, compiled: &CompiledMachine) -> Result<(), MachineError> {
        if let Some(id) = compiled.hook_ids().into_iter().find(|id| !self.contains(id)) {
            return Err(MachineError::UnregisteredHook { id: id.to_string() });
        }
        if let Some(id) = compiled
            .guard_ids()
            .into_iter()
            .find(|id| !self.contains_guard(id))
        {
            return Err(MachineError::UnregisteredGuard { id: id.to_string() });
        }
        Ok(())
    }
}

impl<C> fmt::Debug for HookRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: BTreeSet<&str> = self.hooks.keys().map(String::as_str).collect();
        let guards: BTreeSet<&str> = self.guards.keys().map(String::as_str).collect();
        f.debug_struct("HookRegistry")
            .field("hooks", &hooks)
            .field("guards", &guards)
            .finish()
    }
}
