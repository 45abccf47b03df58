//! Machine descriptions and the scripted nodes built from them.

pub mod config;
pub mod script;

pub use config::{ConnectionConfig, ListenerConfig, MachineConfig, NodeConfig, Scalar};
pub use script::{build_machine, simulate, TickReport, UPDATES_KEY};
