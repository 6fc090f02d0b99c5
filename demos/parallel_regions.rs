//! Parallel Regions
//!
//! This demo walks a machine with a parallel state whose two regions each
//! hold a nested sequential state.
//!
//! Key concepts:
//! - Entering a parallel state enters every region with its defaults
//! - A transition inside one region leaves the other region alone
//! - Hooks run exit first, then the action, then entries
//! - Substate queries over the live configuration
//!
//! Run with: cargo run --example parallel_regions
//! Set RUST_LOG=statecraft=debug to see the engine's own logging.

use statecraft::builder::{Definition, StateDef, TransitionDef};
use statecraft::core::HookContext;
use statecraft::event_enum;
use statecraft::machine::{HookRegistry, Machine, MachineOptions};
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

event_enum! {
    #[allow(non_camel_case_types)]
    enum FsmEvent {
        ToB,
        ToP,
        ToP_1,
        ToP_2,
        ToS,
        ToPASSIVE,
    }
}

fn with_logging(state: StateDef) -> StateDef {
    state.entry("genericEntry").exit("genericExit")
}

fn definition() -> Definition {
    Definition::new("A")
        .state(StateDef::leaf("A"))
        .state(StateDef::leaf("B"))
        .state(with_logging(StateDef::parallel("P")))
        .state(with_logging(
            StateDef::sequential("P_1").parent("P").initial_child("P_1_POWER_SAVING"),
        ))
        .state(with_logging(
            StateDef::sequential("P_1_POWER_SAVING").parent("P_1"),
        ))
        .state(with_logging(
            StateDef::leaf("P_1_POWER_SAVING_ACTIVE")
                .parent("P_1_POWER_SAVING")
                .initial(),
        ))
        .state(with_logging(
            StateDef::leaf("P_1_POWER_SAVING_PASSIVE").parent("P_1_POWER_SAVING"),
        ))
        .state(with_logging(
            StateDef::sequential("P_2").parent("P").initial_child("P_2_S"),
        ))
        .state(with_logging(StateDef::sequential("P_2_S").parent("P_2")))
        .state(with_logging(StateDef::leaf("P_2_S_1").parent("P_2_S")))
        .state(with_logging(StateDef::leaf("P_2_S_2").parent("P_2_S").initial()))
        .state(with_logging(StateDef::sequential("S").initial_child("S_1")))
        .state(with_logging(StateDef::leaf("S_1").parent("S")))
        .state(with_logging(StateDef::leaf("S_2").parent("S")))
        .state(StateDef::leaf("T"))
        .transition(TransitionDef::new("A", "ToB").to("B").action("fromAToB"))
        .transition(TransitionDef::new("B", "ToP").to("P").action("genericTransit"))
        .transition(TransitionDef::new("P", "ToP_1").to("P_1").action("genericTransit"))
        .transition(TransitionDef::new("P", "ToP_2").to("P_2").action("genericTransit"))
        .transition(TransitionDef::new("P", "ToS").to("S").action("genericTransit"))
        .transition(
            TransitionDef::new("P_1", "ToPASSIVE")
                .to("P_1_POWER_SAVING_PASSIVE")
                .action("genericTransit"),
        )
}

fn print_transition(ctx: &HookContext<'_, i32>) {
    println!(
        "Transition from '{}' to '{}' on event '{}' with context '{}'.",
        ctx.from, ctx.to, ctx.event, ctx.context
    );
}

fn hooks() -> HookRegistry<i32> {
    HookRegistry::new()
        .register("fromAToB", print_transition)
        .register("genericTransit", print_transition)
        .register("genericEntry", |ctx: &HookContext<'_, i32>| {
            println!(
                "Entry to '{}' on event '{}' with context '{}'.",
                ctx.state, ctx.event, ctx.context
            );
        })
        .register("genericExit", |ctx: &HookContext<'_, i32>| {
            println!(
                "Exit from '{}' on event '{}' with context '{}'.",
                ctx.state, ctx.event, ctx.context
            );
        })
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    println!("=== Parallel Regions ===\n");

    let compiled = Arc::new(definition().compile()?);
    let options = MachineOptions::default().with_label("parallel-regions");
    let machine = Machine::new(compiled, hooks(), options)?;

    machine.fire(&FsmEvent::ToB, &10)?;

    machine.fire(&FsmEvent::ToP, &10)?;
    println!("Current state is {:?}", machine.current_state());

    machine.fire(&FsmEvent::ToP_1, &10)?;
    println!("Current state is {:?}", machine.current_state());
    machine.fire(&FsmEvent::ToP_2, &10)?;
    println!("Current state is {:?}", machine.current_state());

    machine.fire(&FsmEvent::ToPASSIVE, &10)?;
    println!("Current state is {:?}", machine.current_state());

    for name in [
        "S",
        "P",
        "P_1",
        "P_2",
        "P_1_POWER_SAVING",
        "P_1_POWER_SAVING_PASSIVE",
    ] {
        for substate in machine.sub_states_on(name) {
            println!("Substates on {name}: {substate}");
        }
    }

    println!("\n=== History ===\n");
    for record in machine.history().records() {
        println!(
            "{} -> {:?}: exited {:?}, entered {:?}",
            record.source, record.target, record.exited, record.entered
        );
    }

    Ok(())
}
