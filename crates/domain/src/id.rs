//! Typed identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one listener registration on a notifier channel.
///
/// Two registrations of the same closure get distinct ids, which is what lets
/// an unsubscribe handle remove exactly its own registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(uuid::Uuid);

impl Default for SubscriptionId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl SubscriptionId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        assert_ne!(SubscriptionId::new(), SubscriptionId::new());
    }

    #[test]
    fn should_display_as_hyphenated_uuid() {
        let id = SubscriptionId::new();
        assert_eq!(id.to_string(), id.as_uuid().hyphenated().to_string());
    }
}
