//! Guard predicates for controlling which transition fires.
//!
//! Guards are pure boolean functions evaluated while the engine searches for
//! a transition. They see the same [`HookContext`] hooks do and must not
//! have side effects: a guard can run for a candidate that ends up not
//! firing.

use super::hook::HookContext;

/// Pure predicate deciding whether a candidate transition may fire.
///
/// # Example
///
/// ```rust
/// use statecraft::core::{Guard, HookContext, HookPhase};
///
/// let enough_power = Guard::new(|ctx: &HookContext<'_, u32>| *ctx.context >= 10);
///
/// let charge = 12;
/// let ctx = HookContext {
///     phase: HookPhase::Guard,
///     state: "Idle",
///     from: "Idle",
///     to: "Running",
///     event: "Start",
///     context: &charge,
/// };
/// assert!(enough_power.check(&ctx));
/// ```
pub struct Guard<C> {
    predicate: Box<dyn Fn(&HookContext<'_, C>) -> bool + Send>,
}

impl<C> Guard<C> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and free of side effects.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&HookContext<'_, C>) -> bool + Send + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Check if the guard lets the transition described by `ctx` fire.
    pub fn check(&self, ctx: &HookContext<'_, C>) -> bool {
        (self.predicate)(ctx)
    }
}
