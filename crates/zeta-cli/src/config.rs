//! Machine description loading, from a YAML file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use zeta_csm::{DEFAULT_GATE, START};

/// A whole machine: shared-store seed, nodes and wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Ticks to run when the command line does not override it
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Run `fixed_update` after every N-th `update`; 0 disables it
    pub fixed_every: u64,

    /// Initial shared-store fields
    pub state: BTreeMap<String, Scalar>,

    pub nodes: Vec<NodeConfig>,

    pub connections: Vec<ConnectionConfig>,

    pub listeners: Vec<ListenerConfig>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            fixed_every: 0,
            state: BTreeMap::new(),
            nodes: Vec::new(),
            connections: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

/// A store value as written in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,

    /// Leave through `exit_gate` after this many updates
    #[serde(default)]
    pub countdown: Option<u32>,

    #[serde(default = "default_gate")]
    pub exit_gate: String,

    /// Fire the exit gate without deactivating
    #[serde(default)]
    pub stay_active: bool,

    /// Messages sent on every enter
    #[serde(default)]
    pub broadcast: Vec<String>,

    /// Shared-store key incremented on every enter
    #[serde(default)]
    pub counter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub from: String,

    #[serde(default = "default_gate")]
    pub gate: String,

    pub to: String,

    #[serde(default = "default_gate")]
    pub to_gate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    #[serde(default = "default_message")]
    pub message: String,

    pub to: String,

    #[serde(default = "default_gate")]
    pub to_gate: String,
}

fn default_ticks() -> u64 {
    8
}
fn default_gate() -> String {
    DEFAULT_GATE.to_string()
}
fn default_message() -> String {
    START.to_string()
}

impl MachineConfig {
    /// Load a machine description from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read machine from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse machine from {}", path.display()))?;
        Ok(config)
    }

    /// Problems that do not stop a run but are probably mistakes.
    ///
    /// Duplicate node names are reported here too; building such a machine fails.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut names = BTreeSet::new();

        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                warnings.push(format!("duplicate node name '{}'", node.name));
            }
        }

        for conn in &self.connections {
            if !names.contains(conn.from.as_str()) {
                warnings.push(format!(
                    "connection {}.{} starts at unknown node",
                    conn.from, conn.gate
                ));
            }
            if !names.contains(conn.to.as_str()) {
                warnings.push(format!(
                    "connection {}.{} targets unknown node '{}'",
                    conn.from, conn.gate, conn.to
                ));
            }
        }

        for listener in &self.listeners {
            if !names.contains(listener.to.as_str()) {
                warnings.push(format!(
                    "listener for '{}' targets unknown node '{}'",
                    listener.message, listener.to
                ));
            }
        }

        if !self.listeners.iter().any(|l| l.message == START) {
            warnings.push(format!("no listener for '{START}', nothing will activate"));
        }

        warnings
    }
}
