use std::collections::BTreeMap;
use std::fmt;

use zeta_core::Rolodex;

use crate::{Connections, MessageBus, StateMachine};

/// Private-store key holding the node's name.
pub const NAME_KEY: &str = "Name";
/// Private-store key holding a [`NodeRef`] to the node itself.
pub const NODE_KEY: &str = "Node";

/// A node callback. Receives the machine's shared store and the node's private store
/// through the [`NodeContext`].
pub type NodeAction = Box<dyn FnMut(&mut NodeContext<'_>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Enter,
    Exit,
    Update,
    FixedUpdate,
}

/// Name handle for a node, stored in its private store under [`NODE_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    name: String,
}

impl NodeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message emitted when this node leaves through `gate`.
    pub fn gate_message(&self, gate: &str) -> String {
        Connections::gate_key(&self.name, gate)
    }
}

#[derive(Debug)]
enum Request {
    Message(String),
    FromGate {
        gate: String,
        deactivate: bool,
    },
    ToState {
        target: String,
        out_gate: String,
        in_gate: String,
        deactivate: bool,
    },
}

/// View handed to node callbacks.
///
/// Sends requested here are applied by the node right after the current callback list
/// finishes, in request order: a `send_from_gate` runs the node's exit (gate and exit
/// callbacks) and then enqueues the gate message.
pub struct NodeContext<'a> {
    pub state: &'a mut Rolodex,
    pub stack: &'a mut Rolodex,
    name: &'a str,
    active: bool,
    requests: Vec<Request>,
}

impl NodeContext<'_> {
    pub fn name(&self) -> &str {
        self.name
    }

    /// Whether the node was active when this callback list started.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn send_message(&mut self, message: impl Into<String>) {
        self.requests.push(Request::Message(message.into()));
    }

    pub fn send_from_gate(&mut self, gate: &str, deactivate: bool) {
        self.requests.push(Request::FromGate {
            gate: gate.to_owned(),
            deactivate,
        });
    }

    pub fn send_to_state(&mut self, target: &str, out_gate: &str, in_gate: &str, deactivate: bool) {
        self.requests.push(Request::ToState {
            target: target.to_owned(),
            out_gate: out_gate.to_owned(),
            in_gate: in_gate.to_owned(),
            deactivate,
        });
    }
}

/// Lifecycle hooks for a node written as its own type.
///
/// Each hook runs after the matching callback list (and after the gate action) and sees the
/// same [`NodeContext`]. Every hook defaults to doing nothing.
pub trait NodeBehavior {
    fn enter(&mut self, _ctx: &mut NodeContext<'_>) {}

    fn update(&mut self, _ctx: &mut NodeContext<'_>) {}

    fn fixed_update(&mut self, _ctx: &mut NodeContext<'_>) {}

    fn exit(&mut self, _ctx: &mut NodeContext<'_>) {}
}

#[allow(clippy::too_many_arguments)]
fn invoke(
    name: &str,
    active: bool,
    state: &mut Rolodex,
    stack: &mut Rolodex,
    gate_action: Option<&mut NodeAction>,
    actions: &mut [NodeAction],
    behavior: Option<&mut Box<dyn NodeBehavior>>,
    kind: ActionKind,
) -> Vec<Request> {
    let mut ctx = NodeContext {
        state,
        stack,
        name,
        active,
        requests: Vec::new(),
    };
    if let Some(action) = gate_action {
        action(&mut ctx);
    }
    for action in actions.iter_mut() {
        action(&mut ctx);
    }
    if let Some(behavior) = behavior {
        match kind {
            ActionKind::Enter => behavior.enter(&mut ctx),
            ActionKind::Exit => behavior.exit(&mut ctx),
            ActionKind::Update => behavior.update(&mut ctx),
            ActionKind::FixedUpdate => behavior.fixed_update(&mut ctx),
        }
    }
    ctx.requests
}

/// A named state with lifecycle callbacks and named input/output gates.
pub struct Node {
    name: String,
    active: bool,
    stack: Rolodex,
    bus: MessageBus,
    on_enter: Vec<NodeAction>,
    on_exit: Vec<NodeAction>,
    on_update: Vec<NodeAction>,
    on_fixed_update: Vec<NodeAction>,
    input_gates: BTreeMap<String, NodeAction>,
    output_gates: BTreeMap<String, NodeAction>,
    behavior: Option<Box<dyn NodeBehavior>>,
}

impl Node {
    /// Creates a detached node with a bus of its own. Messages sent before a machine binds
    /// the node are discarded by the rebinding.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut stack = Rolodex::new();
        // A fresh store holds no properties, so these writes cannot be rejected.
        let _ = stack.push(NAME_KEY, name.clone());
        let _ = stack.push(NODE_KEY, NodeRef::new(name.as_str()));

        Self {
            name,
            active: false,
            stack,
            bus: MessageBus::new(),
            on_enter: Vec::new(),
            on_exit: Vec::new(),
            on_update: Vec::new(),
            on_fixed_update: Vec::new(),
            input_gates: BTreeMap::new(),
            output_gates: BTreeMap::new(),
            behavior: None,
        }
    }

    /// Creates a node already bound to `machine` (it still has to be added to it).
    pub fn attached(name: impl Into<String>, machine: &StateMachine) -> Self {
        let mut node = Self::new(name);
        node.initialize(machine.bus());
        node
    }

    /// Binds the node to a machine's bus, dropping the old bus and anything queued on it.
    /// Callbacks are untouched.
    pub fn initialize(&mut self, bus: &MessageBus) {
        self.bus = bus.clone();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.name.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn stack(&self) -> &Rolodex {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Rolodex {
        &mut self.stack
    }

    pub fn add_base_action<F>(&mut self, kind: ActionKind, action: F) -> &mut Self
    where
        F: FnMut(&mut NodeContext<'_>) + 'static,
    {
        self.push_action(kind, Box::new(action));
        self
    }

    pub fn add_base_actions<I>(&mut self, kind: ActionKind, actions: I) -> &mut Self
    where
        I: IntoIterator<Item = NodeAction>,
    {
        for action in actions {
            self.push_action(kind, action);
        }
        self
    }

    pub fn with_action<F>(mut self, kind: ActionKind, action: F) -> Self
    where
        F: FnMut(&mut NodeContext<'_>) + 'static,
    {
        self.add_base_action(kind, action);
        self
    }

    fn push_action(&mut self, kind: ActionKind, action: NodeAction) {
        let list = match kind {
            ActionKind::Enter => &mut self.on_enter,
            ActionKind::Exit => &mut self.on_exit,
            ActionKind::Update => &mut self.on_update,
            ActionKind::FixedUpdate => &mut self.on_fixed_update,
        };
        list.push(action);
    }

    /// Installs the callback for input gate `gate` unless one is already set.
    pub fn set_input_gate_action<F>(&mut self, gate: &str, action: F) -> &mut Self
    where
        F: FnMut(&mut NodeContext<'_>) + 'static,
    {
        self.input_gates
            .entry(gate.to_owned())
            .or_insert_with(|| Box::new(action) as NodeAction);
        self
    }

    /// Installs the callback for output gate `gate` unless one is already set.
    pub fn set_output_gate_action<F>(&mut self, gate: &str, action: F) -> &mut Self
    where
        F: FnMut(&mut NodeContext<'_>) + 'static,
    {
        self.output_gates
            .entry(gate.to_owned())
            .or_insert_with(|| Box::new(action) as NodeAction);
        self
    }

    pub fn with_input_gate<F>(mut self, gate: &str, action: F) -> Self
    where
        F: FnMut(&mut NodeContext<'_>) + 'static,
    {
        self.set_input_gate_action(gate, action);
        self
    }

    pub fn with_output_gate<F>(mut self, gate: &str, action: F) -> Self
    where
        F: FnMut(&mut NodeContext<'_>) + 'static,
    {
        self.set_output_gate_action(gate, action);
        self
    }

    /// Installs the lifecycle hooks, replacing any previous ones.
    pub fn set_behavior<B: NodeBehavior + 'static>(&mut self, behavior: B) -> &mut Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn with_behavior<B: NodeBehavior + 'static>(mut self, behavior: B) -> Self {
        self.set_behavior(behavior);
        self
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    pub fn has_input_gate(&self, gate: &str) -> bool {
        self.input_gates.contains_key(gate)
    }

    pub fn has_output_gate(&self, gate: &str) -> bool {
        self.output_gates.contains_key(gate)
    }

    /// Activates the node, runs the `gate` input callback (if any), every enter callback,
    /// then [`NodeBehavior::enter`].
    pub fn enter(&mut self, state: &mut Rolodex, gate: &str) {
        self.active = true;
        tracing::debug!(node = %self.name, gate, "enter");

        let requests = invoke(
            &self.name,
            self.active,
            state,
            &mut self.stack,
            self.input_gates.get_mut(gate),
            &mut self.on_enter,
            self.behavior.as_mut(),
            ActionKind::Enter,
        );
        self.apply(state, requests);
    }

    pub fn update(&mut self, state: &mut Rolodex) {
        let requests = invoke(
            &self.name,
            self.active,
            state,
            &mut self.stack,
            None,
            &mut self.on_update,
            self.behavior.as_mut(),
            ActionKind::Update,
        );
        self.apply(state, requests);
    }

    pub fn fixed_update(&mut self, state: &mut Rolodex) {
        let requests = invoke(
            &self.name,
            self.active,
            state,
            &mut self.stack,
            None,
            &mut self.on_fixed_update,
            self.behavior.as_mut(),
            ActionKind::FixedUpdate,
        );
        self.apply(state, requests);
    }

    /// Sets `active = !deactivate`, runs the `gate` output callback (if any), every exit
    /// callback, then [`NodeBehavior::exit`]. `deactivate = false` fires the gate without leaving.
    pub fn exit(&mut self, state: &mut Rolodex, gate: &str, deactivate: bool) {
        self.active = !deactivate;
        tracing::debug!(node = %self.name, gate, deactivate, "exit");

        let requests = invoke(
            &self.name,
            self.active,
            state,
            &mut self.stack,
            self.output_gates.get_mut(gate),
            &mut self.on_exit,
            self.behavior.as_mut(),
            ActionKind::Exit,
        );
        self.apply(state, requests);
    }

    /// Exits through `gate` and enqueues `"<name>_<gate>"`.
    pub fn send_from_gate(&mut self, state: &mut Rolodex, gate: &str, deactivate: bool) {
        self.exit(state, gate, deactivate);
        self.bus.send_from_gate(&self.name, gate);
    }

    /// Exits through `out_gate`, wires `(name, out_gate) -> (target, in_gate)` if missing,
    /// and enqueues the gate message.
    pub fn send_to_state(
        &mut self,
        state: &mut Rolodex,
        target: &str,
        out_gate: &str,
        in_gate: &str,
        deactivate: bool,
    ) {
        self.exit(state, out_gate, deactivate);
        self.bus.send_to_state(&self.name, out_gate, target, in_gate);
    }

    pub fn send_message(&self, message: impl Into<String>) {
        self.bus.send(message);
    }

    fn apply(&mut self, state: &mut Rolodex, requests: Vec<Request>) {
        for request in requests {
            match request {
                Request::Message(message) => self.bus.send(message),
                Request::FromGate { gate, deactivate } => {
                    self.send_from_gate(state, &gate, deactivate)
                }
                Request::ToState {
                    target,
                    out_gate,
                    in_gate,
                    deactivate,
                } => self.send_to_state(state, &target, &out_gate, &in_gate, deactivate),
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("stack", &self.stack)
            .field("on_enter", &self.on_enter.len())
            .field("on_exit", &self.on_exit.len())
            .field("on_update", &self.on_update.len())
            .field("on_fixed_update", &self.on_fixed_update.len())
            .field("input_gates", &self.input_gates.keys().collect::<Vec<_>>())
            .field("output_gates", &self.output_gates.keys().collect::<Vec<_>>())
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}
