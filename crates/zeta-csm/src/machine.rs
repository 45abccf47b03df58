use std::any::Any;
use std::cell::Ref;
use std::collections::BTreeMap;

use zeta_core::Rolodex;
use zeta_tools::{emit as trace_emit, TraceEvent};

use crate::{Connections, CsmError, MessageBus, Node, Result, Target};

/// Joins a node name and a gate name into a gate-qualified message.
pub const SPLITTER: &str = "_";
/// Gate used when none is named.
pub const DEFAULT_GATE: &str = "Default";
/// Message enqueued by [`StateMachine::initialize`].
pub const START: &str = "Start";

/// Owns the nodes, the transition table, the pending-message queue and the shared store.
///
/// Ticks are two-phase: [`StateMachine::update`] and [`StateMachine::fixed_update`] first run
/// every active node (in name order), then drain the queue once. Messages sent while the
/// queue is drained wait for the next tick.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: Rolodex,
    nodes: BTreeMap<String, Node>,
    bus: MessageBus,
    tick: u64,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebinds every node to this machine and enqueues [`START`]. Activates nothing by
    /// itself.
    pub fn initialize(&mut self) {
        for node in self.nodes.values_mut() {
            node.initialize(&self.bus);
        }
        self.send_message(START);
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn state(&self) -> &Rolodex {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Rolodex {
        &mut self.state
    }

    /// Number of ticks run so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Writes a field (or a bound property) of the shared store.
    pub fn push<T: Any + Clone>(&mut self, name: &str, value: T) -> Result<bool> {
        Ok(self.state.push(name, value)?)
    }

    /// Registers a property on the shared store.
    pub fn register<T, G, S>(&mut self, name: &str, getter: G, setter: S) -> Result<bool>
    where
        T: Any + Clone,
        G: Fn() -> T + 'static,
        S: Fn(T) + 'static,
    {
        Ok(self.state.register(name, getter, setter)?)
    }

    pub fn add_node(&mut self, mut node: Node) -> Result<&mut Self> {
        if self.nodes.contains_key(node.name()) {
            return Err(CsmError::DuplicateName {
                name: node.name().to_owned(),
            });
        }

        node.initialize(&self.bus);
        self.nodes.insert(node.name().to_owned(), node);
        Ok(self)
    }

    /// Drops the node. Connections naming it stay and resolve to nothing.
    pub fn remove_node(&mut self, name: &str) -> bool {
        self.nodes.remove(name).is_some()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.nodes.get(name).is_some_and(Node::is_active)
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes
            .values()
            .filter(|n| n.is_active())
            .map(Node::name)
    }

    pub fn connections(&self) -> Ref<'_, Connections> {
        self.bus.connections()
    }

    pub fn pending(&self) -> Vec<String> {
        self.bus.pending()
    }

    pub fn add_connection(
        &mut self,
        from: &str,
        from_gate: &str,
        to: &str,
        to_gate: &str,
    ) -> &mut Self {
        self.bus
            .connect(Connections::gate_key(from, from_gate), Target::new(to, to_gate));
        self
    }

    /// Connects the default gates of two nodes.
    pub fn connect(&mut self, from: &str, to: &str) -> &mut Self {
        self.add_connection(from, DEFAULT_GATE, to, DEFAULT_GATE)
    }

    pub fn remove_connection(&mut self, from: &str, from_gate: &str, to: &str, to_gate: &str) -> bool {
        self.bus.disconnect(
            &Connections::gate_key(from, from_gate),
            &Target::new(to, to_gate),
        )
    }

    pub fn add_message_listener(&mut self, message: &str, to: &str, to_gate: &str) -> &mut Self {
        self.bus.connect(message, Target::new(to, to_gate));
        self
    }

    pub fn remove_message_listener(&mut self, message: &str, to: &str, to_gate: &str) -> bool {
        self.bus.disconnect(message, &Target::new(to, to_gate))
    }

    pub fn send_message(&mut self, message: impl Into<String>) {
        self.bus.send(message);
    }

    pub fn send_from_gate(&mut self, node: &str, gate: &str) {
        self.bus.send_from_gate(node, gate);
    }

    pub fn send_to_state(&mut self, from: &str, from_gate: &str, to: &str, to_gate: &str) {
        self.bus.send_to_state(from, from_gate, to, to_gate);
    }

    pub fn update(&mut self) {
        self.begin_tick("update");
        for node in self.nodes.values_mut().filter(|n| n.is_active()) {
            node.update(&mut self.state);
        }
        self.process_messages();
    }

    pub fn fixed_update(&mut self) {
        self.begin_tick("fixed_update");
        for node in self.nodes.values_mut().filter(|n| n.is_active()) {
            node.fixed_update(&mut self.state);
        }
        self.process_messages();
    }

    fn begin_tick(&mut self, kind: &'static str) {
        self.tick += 1;
        trace_emit(&mut self.state, TraceEvent::new(self.tick, kind));
    }

    /// Resolves every pending message, in enqueue order, into `enter` calls on its targets.
    pub fn process_messages(&mut self) {
        let pending = self.bus.take_pending();
        if pending.is_empty() {
            return;
        }
        tracing::debug!(tick = self.tick, count = pending.len(), "processing messages");

        for message in pending {
            trace_emit(
                &mut self.state,
                TraceEvent::new(self.tick, "message").with_subject(message.as_str()),
            );

            for target in self.bus.targets(&message) {
                let Some(node) = self.nodes.get_mut(&target.node) else {
                    tracing::trace!(%message, node = %target.node, "stale connection target");
                    trace_emit(
                        &mut self.state,
                        TraceEvent::new(self.tick, "stale")
                            .with_subject(target.node)
                            .with_detail(target.gate),
                    );
                    continue;
                };

                trace_emit(
                    &mut self.state,
                    TraceEvent::new(self.tick, "enter")
                        .with_subject(target.node.as_str())
                        .with_detail(target.gate.as_str()),
                );
                node.enter(&mut self.state, &target.gate);
            }
        }
    }
}
