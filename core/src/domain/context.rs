use crate::domain::runtime::ServiceHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("could not expand environment value for '{key}': {reason}")]
    Expansion { key: String, reason: String },
}

/// An insertion-ordered string map.
///
/// `set` keeps the position of an existing key while replacing its value,
/// so later binding sets override earlier ones without reordering. Lookups
/// are order-independent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvMap {
    entries: Vec<(String, String)>,
}

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Per-run aggregate for one orchestrator invocation.
///
/// `containers` is populated once by the provisioner and read-only after;
/// `exported_env` is built once by the expander. The context is created at
/// the start of a run and dropped at its end, never shared across runs.
#[derive(Debug, Default)]
pub struct BuildContext {
    pub containers: HashMap<String, ServiceHandle>,
    pub exported_env: EnvMap,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the exported environment into the process-wide environment.
    ///
    /// This is intentional global mutable state with process-lifetime
    /// scope: set once per run, never rolled back, overwritten by the next
    /// run's export. The orchestrator's default path instead passes the
    /// map explicitly into each spawn; this shim exists for callers that
    /// need other in-process code to observe the variables.
    pub fn export_to_process(&self) {
        for (key, value) in self.exported_env.iter() {
            std::env::set_var(key, value);
        }
    }
}
