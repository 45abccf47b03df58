//! Gated finite-state-machine runtime built on `zeta-core`.
//!
//! A [`StateMachine`] owns named [`Node`]s, a transition table of [`Connections`] and a
//! queue of pending messages. Each tick runs the active nodes first and only then resolves
//! the messages they sent, so a node never observes transitions triggered in the same tick.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod bus;
pub mod connections;
pub mod error;
pub mod machine;
pub mod node;

pub use bus::MessageBus;
pub use connections::{Connections, Target};
pub use error::{CsmError, Result};
pub use machine::{StateMachine, DEFAULT_GATE, SPLITTER, START};
pub use node::{
    ActionKind, Node, NodeAction, NodeBehavior, NodeContext, NodeRef, NAME_KEY, NODE_KEY,
};
