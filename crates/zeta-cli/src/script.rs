//! Turns a [`MachineConfig`] into a running [`StateMachine`].

use anyhow::{Context, Result};
use zeta_core::Rolodex;
use zeta_csm::{ActionKind, Node, NodeContext, StateMachine};

use crate::config::{MachineConfig, NodeConfig, Scalar};

/// Private-store key counting updates since the node last entered.
pub const UPDATES_KEY: &str = "Updates";

/// Active nodes after one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub fixed: bool,
    pub active: Vec<String>,
}

pub fn build_machine(config: &MachineConfig) -> Result<StateMachine> {
    let mut machine = StateMachine::new();

    for (name, value) in &config.state {
        seed(machine.state_mut(), name, value)
            .with_context(|| format!("Failed to seed shared store field '{name}'"))?;
    }

    for node in &config.nodes {
        machine
            .add_node(scripted_node(node))
            .with_context(|| format!("Failed to add node '{}'", node.name))?;
    }

    for conn in &config.connections {
        machine.add_connection(&conn.from, &conn.gate, &conn.to, &conn.to_gate);
    }
    for listener in &config.listeners {
        machine.add_message_listener(&listener.message, &listener.to, &listener.to_gate);
    }

    Ok(machine)
}

/// Initializes `machine` and runs `ticks` updates, with a fixed update after every
/// `fixed_every`-th one.
pub fn simulate(machine: &mut StateMachine, ticks: u64, fixed_every: u64) -> Vec<TickReport> {
    machine.initialize();

    let mut reports = Vec::new();
    for i in 1..=ticks {
        machine.update();
        reports.push(report(machine, false));

        if fixed_every > 0 && i % fixed_every == 0 {
            machine.fixed_update();
            reports.push(report(machine, true));
        }
    }
    reports
}

fn report(machine: &StateMachine, fixed: bool) -> TickReport {
    TickReport {
        tick: machine.tick(),
        fixed,
        active: machine.active_nodes().map(str::to_owned).collect(),
    }
}

fn seed(store: &mut Rolodex, name: &str, value: &Scalar) -> zeta_core::Result<bool> {
    match value {
        Scalar::Bool(v) => store.push(name, *v),
        Scalar::Int(v) => store.push(name, *v),
        Scalar::Float(v) => store.push(name, *v),
        Scalar::Text(v) => store.push(name, v.clone()),
    }
}

fn scripted_node(config: &NodeConfig) -> Node {
    let broadcast = config.broadcast.clone();
    let counter = config.counter.clone();
    let countdown = config.countdown;
    let exit_gate = config.exit_gate.clone();
    let stay_active = config.stay_active;

    Node::new(config.name.as_str())
        .with_action(ActionKind::Enter, move |ctx| {
            if let Err(err) = ctx.stack.push(UPDATES_KEY, 0u32) {
                tracing::warn!(node = ctx.name(), error = %err, "cannot reset update count");
            }
            for message in &broadcast {
                ctx.send_message(message.as_str());
            }
            if let Some(key) = &counter {
                bump(ctx, key);
            }
        })
        .with_action(ActionKind::Update, move |ctx| {
            let updates = match ctx.stack.pull::<u32>(UPDATES_KEY, 0) {
                Ok(n) => n.saturating_add(1),
                Err(err) => {
                    tracing::warn!(node = ctx.name(), error = %err, "cannot read update count");
                    return;
                }
            };

            let done = countdown.is_some_and(|limit| updates >= limit);
            let next = if done && stay_active { 0 } else { updates };
            if let Err(err) = ctx.stack.push(UPDATES_KEY, next) {
                tracing::warn!(node = ctx.name(), error = %err, "cannot store update count");
            }

            if done {
                ctx.send_from_gate(&exit_gate, !stay_active);
            }
        })
}

fn bump(ctx: &mut NodeContext<'_>, key: &str) {
    let result = ctx
        .state
        .pull::<i64>(key, 0)
        .and_then(|count| ctx.state.push(key, count + 1));
    if let Err(err) = result {
        tracing::warn!(node = ctx.name(), counter = key, error = %err, "cannot bump counter");
    }
}
