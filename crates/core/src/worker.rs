//! Worker entity as seen by the dispatcher registry.

use serde::{Deserialize, Serialize};

/// A remote worker known to the dispatcher.
///
/// Lifetime in the in-memory registry is bounded by heartbeats; a
/// persisted worker row is independent of live membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Worker {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }
}
