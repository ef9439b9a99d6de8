//! Service lifecycle: the readiness state machine every registered service
//! walks through.
//!
//! ```text
//! Uninitialized ──▶ Initializing ──▶ Ready
//!                        │
//!                        └─────────▶ Failed ──(explicit reinitialize)──▶ Initializing
//! ```
//!
//! `Ready` and `Failed` are terminal for batch runs. Leaving `Failed` is only
//! possible through a caller-driven re-initialization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Readiness of one registered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl ReadyState {
    /// Whether the service has settled (`Ready` or `Failed`).
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Whether a batch run should start this service.
    #[must_use]
    pub fn is_pending(self) -> bool {
        self == Self::Uninitialized
    }

    /// Check the transition table.
    ///
    /// `Initializing → Uninitialized` only happens when the run was cancelled
    /// before `initialize()` returned.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized | Self::Failed, Self::Initializing)
                | (
                    Self::Initializing,
                    Self::Ready | Self::Failed | Self::Uninitialized
                )
        )
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}
