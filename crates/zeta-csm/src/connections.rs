use std::collections::BTreeMap;

use crate::machine::SPLITTER;

/// A `(node, input gate)` pair a message resolves to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target {
    pub node: String,
    pub gate: String,
}

impl Target {
    pub fn new(node: impl Into<String>, gate: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            gate: gate.into(),
        }
    }
}

/// Transition table keyed by message.
///
/// Keys are either gate-qualified (`"<node>_<gate>"`, see [`Connections::gate_key`]) or bare
/// message names used by listeners. Each key maps to an ordered list of unique targets; a
/// key whose list becomes empty is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connections {
    routes: BTreeMap<String, Vec<Target>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate_key(node: &str, gate: &str) -> String {
        format!("{node}{SPLITTER}{gate}")
    }

    /// Appends `target` under `key`. Returns `false` if the pair was already present.
    pub fn insert(&mut self, key: impl Into<String>, target: Target) -> bool {
        let targets = self.routes.entry(key.into()).or_default();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        true
    }

    /// Removes `target` from `key`, dropping the key once its list is empty.
    pub fn remove(&mut self, key: &str, target: &Target) -> bool {
        let Some(targets) = self.routes.get_mut(key) else {
            return false;
        };
        let Some(index) = targets.iter().position(|t| t == target) else {
            return false;
        };

        targets.remove(index);
        if targets.is_empty() {
            self.routes.remove(key);
        }
        true
    }

    /// Targets in insertion order; empty for unknown keys.
    pub fn targets(&self, key: &str) -> &[Target] {
        self.routes.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.routes.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
