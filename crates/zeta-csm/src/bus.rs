use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::{Connections, Target};

#[derive(Default)]
struct BusState {
    connections: Connections,
    pending: Vec<String>,
}

/// Shared handle to a state machine's transition table and pending-message queue.
///
/// Nodes hold a clone of their machine's bus so they can enqueue messages and add ad-hoc
/// connections without a reference back to the machine. Every method borrows the inner
/// state only for its own duration.
#[derive(Clone, Default)]
pub struct MessageBus {
    inner: Rc<RefCell<BusState>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&self, message: impl Into<String>) {
        self.inner.borrow_mut().pending.push(message.into());
    }

    pub fn send_from_gate(&self, node: &str, gate: &str) {
        self.send(Connections::gate_key(node, gate));
    }

    /// Ensures `(node, out_gate) -> (target, in_gate)` exists, then sends from the gate.
    pub fn send_to_state(&self, node: &str, out_gate: &str, target: &str, in_gate: &str) {
        self.connect(Connections::gate_key(node, out_gate), Target::new(target, in_gate));
        self.send_from_gate(node, out_gate);
    }

    pub fn connect(&self, key: impl Into<String>, target: Target) -> bool {
        self.inner.borrow_mut().connections.insert(key, target)
    }

    pub fn disconnect(&self, key: &str, target: &Target) -> bool {
        self.inner.borrow_mut().connections.remove(key, target)
    }

    /// Snapshot of the targets for `message`, so callers may mutate the bus while
    /// delivering.
    pub fn targets(&self, message: &str) -> Vec<Target> {
        self.inner.borrow().connections.targets(message).to_vec()
    }

    pub fn connections(&self) -> Ref<'_, Connections> {
        Ref::map(self.inner.borrow(), |state| &state.connections)
    }

    pub fn pending(&self) -> Vec<String> {
        self.inner.borrow().pending.clone()
    }

    pub(crate) fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.borrow_mut().pending)
    }

    pub fn same_bus(&self, other: &MessageBus) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("MessageBus")
            .field("connections", &state.connections.len())
            .field("pending", &state.pending)
            .finish()
    }
}
