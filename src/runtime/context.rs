//! # Runtime Context
//!
//! State shared by the controllers of every kind.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{
    BackoffState, Dispatcher, EngineContext, KubeStore, Reconcilable,
};
use kube::Client;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Per-resource Fibonacci backoff for reconciliations that returned an error
///
/// Keys are `Kind/namespace/name` so a failing resource never slows down another one.
#[derive(Debug)]
pub struct BackoffTracker {
    min_minutes: u64,
    max_minutes: u64,
    states: Mutex<HashMap<String, BackoffState>>,
}

impl BackoffTracker {
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            max_minutes,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Count one more error for `key` and return the delay before the retry,
    /// with the number of consecutive errors so far
    pub fn next_delay(&self, key: &str) -> (Duration, u32) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let state = states
            .entry(key.to_string())
            .or_insert_with(|| BackoffState::new(self.min_minutes, self.max_minutes));
        state.increment_error();
        (state.backoff.next_backoff(), state.error_count)
    }

    /// Forget the error history of `key` after a successful pass
    pub fn reset(&self, key: &str) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    pub fn tracked(&self) -> usize {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Reconciler context handed to every controller
pub struct Reconciler {
    pub client: Client,
    pub engine: Arc<EngineContext>,
    pub backoff: BackoffTracker,
    /// Delay used when the engine asks for no requeue
    pub resync_interval: Duration,
    /// Deadline for one reconciliation pass
    pub reconcile_timeout: Duration,
    pub max_concurrent_reconciliations: u16,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("engine", &self.engine)
            .field("tracked_backoffs", &self.backoff.tracked())
            .field("resync_interval", &self.resync_interval)
            .field("reconcile_timeout", &self.reconcile_timeout)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(client: Client, engine: Arc<EngineContext>, config: &ControllerConfig) -> Self {
        Self {
            client,
            engine,
            backoff: BackoffTracker::new(
                config.error_backoff_min_minutes,
                config.error_backoff_max_minutes,
            ),
            resync_interval: config.resync_interval(),
            reconcile_timeout: config.reconcile_timeout(),
            max_concurrent_reconciliations: config.max_concurrent_reconciliations,
        }
    }

    /// Dispatcher for kind `K` backed by the Kubernetes API
    pub fn dispatcher<K: Reconcilable>(&self) -> Dispatcher<K> {
        Dispatcher::new(
            Arc::new(KubeStore::<K>::new(self.client.clone())),
            Arc::clone(&self.engine),
        )
    }
}
