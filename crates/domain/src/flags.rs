//! Feature flags held by the config service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flag values keyed by name, as persisted under the remote-config key.
pub type FlagMap = BTreeMap<String, serde_json::Value>;

/// Broadcast when a flag is set or cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagChange {
    pub key: String,
    pub previous: Option<serde_json::Value>,
    pub current: Option<serde_json::Value>,
}

impl FlagChange {
    /// Whether the value actually changed.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.previous != self.current
    }
}
