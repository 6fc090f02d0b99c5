//! Machine instances: the only place an active configuration changes.

use crate::builder::CompiledMachine;
use crate::core::{
    Event, HookContext, HookPhase, NodeId, StateTree, Transition, TransitionHistory,
    TransitionRecord,
};
use crate::engine::{ActiveConfiguration, Plan};
use crate::machine::error::{FireError, MachineError};
use crate::machine::hooks::HookRegistry;
use crate::machine::options::MachineOptions;
use crate::machine::outcome::{Outcome, TransitionSummary};
use crate::machine::query;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, error, trace, warn};
use uuid::Uuid;

/// Whether a machine still accepts events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    Running,
    Terminated,
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Terminated => f.write_str("terminated"),
        }
    }
}

/// A running instance of a [`CompiledMachine`].
///
/// Each instance owns its active configuration and hook registry and shares
/// the compiled tree with every other instance built from it. Methods take
/// `&self`, so hooks holding a handle to the machine can query it while a
/// transition runs; firing from inside a hook is rejected with
/// [`FireError::Reentrant`].
///
/// # Example
///
/// ```rust
/// use statecraft::builder::{Definition, StateDef, TransitionDef};
/// use statecraft::machine::{HookRegistry, Machine};
/// use std::sync::Arc;
///
/// let compiled = Definition::new("Idle")
///     .state(StateDef::leaf("Idle"))
///     .state(StateDef::leaf("Running"))
///     .transition(TransitionDef::new("Idle", "Start").to("Running"))
///     .compile()
///     .unwrap();
///
/// let machine: Machine<()> = Machine::with_defaults(Arc::new(compiled), HookRegistry::new()).unwrap();
/// machine.fire("Start", &()).unwrap();
///
/// assert!(machine.is_active("Running"));
/// ```
pub struct Machine<C> {
    id: Uuid,
    compiled: Arc<CompiledMachine>,
    hooks: HookRegistry<C>,
    options: MachineOptions,
    active: RefCell<ActiveConfiguration>,
    last: RefCell<Option<BTreeSet<String>>>,
    history: RefCell<TransitionHistory>,
    status: Cell<MachineStatus>,
    firing: Cell<bool>,
}

impl<C> Machine<C> {
    /// Start a machine in its initial configuration.
    ///
    /// No hooks run on start.
    ///
    /// # Errors
    ///
    /// Fails when the definition refers to a hook or guard id `hooks` does
    /// not provide.
    pub fn new(
        compiled: Arc<CompiledMachine>,
        hooks: HookRegistry<C>,
        options: MachineOptions,
    ) -> Result<Self, MachineError> {
        hooks.verify_against(&compiled)?;

        let initial = compiled.engine().initial_configuration();
        initial.verify(compiled.tree())?;

        let machine = Self {
            id: Uuid::new_v4(),
            history: RefCell::new(TransitionHistory::with_limit(options.history_limit)),
            compiled,
            hooks,
            options,
            active: RefCell::new(initial),
            last: RefCell::new(None),
            status: Cell::new(MachineStatus::Running),
            firing: Cell::new(false),
        };
        debug!(
            machine = %machine.id,
            label = machine.label(),
            active = ?machine.active_states(),
            "started state machine"
        );
        Ok(machine)
    }

    pub fn with_defaults(
        compiled: Arc<CompiledMachine>,
        hooks: HookRegistry<C>,
    ) -> Result<Self, MachineError> {
        Self::new(compiled, hooks, MachineOptions::default())
    }

    /// Handle one event.
    ///
    /// The matching transition is planned and verified first. Exit hooks
    /// then run deepest first, the action runs once, entry hooks run
    /// shallowest first, and only then is the new configuration committed.
    /// An event nothing handles returns [`Outcome::NoMatch`].
    ///
    /// # Errors
    ///
    /// - [`FireError::Terminated`] after [`terminate`](Self::terminate)
    /// - [`FireError::Reentrant`] when called from inside a hook or guard
    /// - [`FireError::Invariant`] if the planned configuration is invalid
    ///
    /// The active configuration is unchanged in every error case.
    pub fn fire<E: Event + ?Sized>(&self, event: &E, context: &C) -> Result<Outcome, FireError> {
        let tag = event.tag();
        let span = debug_span!("fire", machine = %self.id, label = self.label(), event = tag);
        let _entered = span.enter();

        if self.status.get() == MachineStatus::Terminated {
            warn!("rejected event for terminated machine");
            return Err(FireError::Terminated {
                event: tag.to_string(),
            });
        }
        let Some(_in_flight) = InFlight::acquire(&self.firing) else {
            warn!("rejected reentrant event");
            return Err(FireError::Reentrant {
                event: tag.to_string(),
            });
        };

        let engine = self.compiled.engine();
        let planned = {
            let active = self.active.borrow();
            engine.plan(&active, tag, |transition| self.accepts(transition, tag, context))
        };
        let plan = match planned {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                trace!("no transition matched");
                return Ok(Outcome::NoMatch {
                    event: tag.to_string(),
                });
            }
            Err(violation) => {
                error!(%violation, "planned configuration is invalid");
                return Err(violation.into());
            }
        };

        self.run(&plan, tag, context);
        Ok(self.commit(plan, tag))
    }

    /// Whether an active state declares a transition on `event`.
    ///
    /// Guards are not evaluated.
    pub fn can_accept<E: Event + ?Sized>(&self, event: &E) -> bool {
        let active = self.active.borrow();
        self.compiled
            .engine()
            .find_match(&active, event.tag(), |_| true)
            .is_some()
    }

    /// Names of the active leaves.
    pub fn current_state(&self) -> BTreeSet<String> {
        self.active.borrow().leaves(self.tree())
    }

    /// Every active state, shallowest first.
    pub fn active_states(&self) -> Vec<String> {
        self.active.borrow().names(self.tree())
    }

    pub fn active_configuration(&self) -> ActiveConfiguration {
        self.active.borrow().clone()
    }

    /// Whether `name` is an active state. Unknown names are never active.
    pub fn is_active(&self, name: &str) -> bool {
        self.tree()
            .lookup(name)
            .is_some_and(|id| self.active.borrow().contains(id))
    }

    /// Active states strictly below `name`, shallowest first.
    ///
    /// Unknown or inactive names give an empty list.
    pub fn sub_states_on(&self, name: &str) -> Vec<String> {
        query::sub_states_on(self.tree(), &self.active.borrow(), name)
    }

    /// The top-level state the machine started in.
    pub fn initial_state(&self) -> &str {
        self.compiled.initial_state()
    }

    /// Active leaves before the most recent transition that changed the
    /// configuration.
    pub fn last_state(&self) -> Option<BTreeSet<String>> {
        self.last.borrow().clone()
    }

    /// Snapshot of the committed transitions.
    pub fn history(&self) -> TransitionHistory {
        self.history.borrow().clone()
    }

    /// Stop accepting events. Queries keep working.
    pub fn terminate(&self) {
        if self.status.replace(MachineStatus::Terminated) == MachineStatus::Running {
            debug!(machine = %self.id, label = self.label(), "terminated state machine");
        }
    }

    pub fn status(&self) -> MachineStatus {
        self.status.get()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Label from the options, or `"machine"`.
    pub fn label(&self) -> &str {
        self.options.label.as_deref().unwrap_or("machine")
    }

    pub fn options(&self) -> &MachineOptions {
        &self.options
    }

    pub fn compiled(&self) -> &Arc<CompiledMachine> {
        &self.compiled
    }

    fn tree(&self) -> &StateTree {
        self.compiled.tree()
    }

    /// Guard check for one candidate.
    fn accepts(&self, transition: &Transition, event: &str, context: &C) -> bool {
        let Some(guard) = transition.guard() else {
            return true;
        };
        let tree = self.tree();
        let from = tree.name(transition.source());
        let to = transition.target().map_or(from, |id| tree.name(id));
        let ctx = HookContext {
            phase: HookPhase::Guard,
            state: from,
            from,
            to,
            event,
            context,
        };
        let passed = self.hooks.check_guard(guard, &ctx);
        trace!(guard, from, to, passed, "evaluated guard");
        passed
    }

    /// Run exit hooks, the action and entry hooks of `plan`.
    fn run(&self, plan: &Plan, event: &str, context: &C) {
        let tree = self.tree();
        let transition = plan.transition();
        let from = tree.name(transition.source());
        let to = transition.target().map_or(from, |id| tree.name(id));
        let base = HookContext {
            phase: HookPhase::Action,
            state: from,
            from,
            to,
            event,
            context,
        };

        for &id in plan.exits() {
            let node = tree.node(id);
            if let Some(hook) = node.exit_hook() {
                self.invoke(hook, &base.at(HookPhase::Exit, node.name()));
            }
        }
        if let Some(action) = transition.action() {
            self.invoke(action, &base);
        }
        for &id in plan.entries() {
            let node = tree.node(id);
            if let Some(hook) = node.entry_hook() {
                self.invoke(hook, &base.at(HookPhase::Entry, node.name()));
            }
        }
    }

    fn invoke(&self, hook: &str, ctx: &HookContext<'_, C>) {
        if self.options.trace_hooks {
            debug!(hook, phase = %ctx.phase, state = ctx.state, "running hook");
        } else {
            trace!(hook, phase = %ctx.phase, state = ctx.state, "running hook");
        }
        if !self.hooks.invoke(hook, ctx) {
            warn!(hook, "hook disappeared from registry");
        }
    }

    /// Replace the active configuration with the planned one and record it.
    fn commit(&self, plan: Plan, event: &str) -> Outcome {
        let tree = self.tree();
        let source = tree.name(plan.transition.source()).to_string();
        let target = plan.transition.target().map(|id| tree.name(id).to_string());
        let exited = names(tree, &plan.exits);
        let entered = names(tree, &plan.entries);

        self.history.borrow_mut().record(TransitionRecord {
            event: event.to_string(),
            source: source.clone(),
            target: target.clone(),
            exited: exited.clone(),
            entered: entered.clone(),
            timestamp: Utc::now(),
        });

        let Some(target) = target else {
            debug!(from = %source, "ran internal transition");
            return Outcome::Internal {
                source,
                event: event.to_string(),
            };
        };

        let previous = self.active.replace(plan.next).leaves(tree);
        let current = self.current_state();
        *self.last.borrow_mut() = Some(previous.clone());

        debug!(
            from = %source,
            to = %target,
            ?exited,
            ?entered,
            ?current,
            "committed transition"
        );
        Outcome::Transitioned(TransitionSummary {
            event: event.to_string(),
            source,
            target,
            exited,
            entered,
            previous,
            current,
        })
    }
}

impl<C> fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.id)
            .field("label", &self.label())
            .field("status", &self.status.get())
            .field("active", &self.active_states())
            .field("hooks", &self.hooks)
            .finish()
    }
}

fn names(tree: &StateTree, ids: &[NodeId]) -> Vec<String> {
    ids.iter().map(|&id| tree.name(id).to_string()).collect()
}

/// Marks a machine as handling an event until dropped, including on panic.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
