//! # Types
//!
//! Core types for the reconciler.

use super::store::StoreError;
use crate::auth::AuthError;
use crate::controller::backoff::FibonacciBackoff;
use std::time::Duration;
use thiserror::Error;

/// Message reported when a resource names no tenant
pub const MISSING_TENANT_MESSAGE: &str = "Tenant ID is not specified in the resource spec";

/// Error surfaced to the controller runtime
///
/// Remote API failures never show up here: they are classified by the phase manager and
/// recorded in the resource status instead.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// Resource cannot be reconciled until its spec is fixed
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// Status or finalizer write rejected by the API server
    #[error("failed to persist resource: {0}")]
    Persistence(#[source] StoreError),

    /// Resource could not be loaded
    #[error("failed to load resource: {0}")]
    Store(#[source] StoreError),

    /// Pass exceeded the per-reconciliation deadline
    #[error("reconciliation did not finish within {0:?}")]
    Timeout(Duration),
}

impl ReconcilerError {
    /// Retrying cannot help until the resource changes
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Lost an optimistic concurrency race
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Persistence(StoreError::Conflict { .. }) | Self::Store(StoreError::Conflict { .. })
        )
    }
}

/// Requeue directive returned by every phase handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requeue {
    /// Whether the engine wants to run again
    pub requeue: bool,
    /// Delay before the next run when `requeue` is set
    pub after: Duration,
}

impl Requeue {
    #[must_use]
    pub fn after(after: Duration) -> Self {
        Self {
            requeue: true,
            after,
        }
    }

    /// Nothing to do until the resource changes or the periodic resync fires
    #[must_use]
    pub fn done() -> Self {
        Self {
            requeue: false,
            after: Duration::ZERO,
        }
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Timing knobs of the phase manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Requeue interval after a transition, and the debounce window for same-phase writes
    pub requeue_interval: Duration,
    /// Ceiling for Creating, Provisioning and Updating
    pub phase_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        use crate::constants::{DEFAULT_PHASE_TIMEOUT_SECS, DEFAULT_REQUEUE_INTERVAL_SECS};
        Self {
            requeue_interval: Duration::from_secs(DEFAULT_REQUEUE_INTERVAL_SECS),
            phase_timeout: Duration::from_secs(DEFAULT_PHASE_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_state_reset() {
        let mut state = BackoffState::new(1, 10);
        state.increment_error();
        state.increment_error();
        assert_eq!(state.backoff.next_backoff_seconds(), 60);
        assert_eq!(state.backoff.next_backoff_seconds(), 60);
        assert_eq!(state.error_count, 2);

        state.reset();
        assert_eq!(state.error_count, 0);
        assert_eq!(state.backoff.next_backoff_seconds(), 60);
    }

    #[test]
    fn test_error_kinds() {
        let err = ReconcilerError::Configuration(MISSING_TENANT_MESSAGE.to_string());
        assert!(err.is_terminal());
        assert!(!err.is_conflict());

        let err = ReconcilerError::Persistence(StoreError::Conflict {
            namespace: "team-a".to_string(),
            name: "main".to_string(),
        });
        assert!(err.is_conflict());
        assert!(!err.is_terminal());
    }
}
