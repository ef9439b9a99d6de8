//! Initialization report: what a batch run hands back to the bootstrap driver.
//!
//! The report lists every registered service in registration order together
//! with its settled outcome, so the driver can decide whether to proceed,
//! degrade, or abort.

use std::fmt;

use crate::error::InitializationError;
use crate::lifecycle::ReadyState;
use crate::time::{Timestamp, elapsed_ms};

/// Settled outcome of one service.
#[derive(Debug, Clone)]
pub enum ServiceOutcome {
    Ready,
    Failed(InitializationError),
}

impl ServiceOutcome {
    #[must_use]
    pub fn state(&self) -> ReadyState {
        match self {
            Self::Ready => ReadyState::Ready,
            Self::Failed(_) => ReadyState::Failed,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// The captured failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&InitializationError> {
        match self {
            Self::Ready => None,
            Self::Failed(err) => Some(err),
        }
    }
}

/// One line of the report.
#[derive(Debug, Clone)]
pub struct ServiceReport {
    pub service: &'static str,
    pub outcome: ServiceOutcome,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl ServiceReport {
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        elapsed_ms(self.started_at, self.finished_at)
    }
}

/// Outcomes of all registered services, in registration order.
#[derive(Debug, Clone, Default)]
pub struct InitializationReport {
    entries: Vec<ServiceReport>,
}

impl InitializationReport {
    #[must_use]
    pub fn new(entries: Vec<ServiceReport>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[ServiceReport] {
        &self.entries
    }

    /// Look up a service by name.
    ///
    /// Returns the first entry with that name; iterate
    /// [`entries`](Self::entries) when several services share one.
    #[must_use]
    pub fn get(&self, service: &str) -> Option<&ServiceReport> {
        self.entries.iter().find(|entry| entry.service == service)
    }

    #[must_use]
    pub fn outcome(&self, service: &str) -> Option<&ServiceOutcome> {
        self.get(service).map(|entry| &entry.outcome)
    }

    /// Names in registration order.
    pub fn services(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.service)
    }

    pub fn failures(&self) -> impl Iterator<Item = &InitializationError> {
        self.entries.iter().filter_map(|entry| entry.outcome.error())
    }

    #[must_use]
    pub fn is_all_ready(&self) -> bool {
        self.entries.iter().all(|entry| entry.outcome.is_ready())
    }

    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.is_ready())
            .count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.entries.len() - self.ready_count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for InitializationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} services: {} ready, {} failed",
            self.len(),
            self.ready_count(),
            self.failed_count()
        )?;
        let failed: Vec<&str> = self.failures().map(|err| err.service).collect();
        if !failed.is_empty() {
            write!(f, " ({})", failed.join(", "))?;
        }
        Ok(())
    }
}
