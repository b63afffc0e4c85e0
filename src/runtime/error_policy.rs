//! # Error Policy
//!
//! Requeue decisions for reconciliations that returned an error.
//!
//! Remote API failures never get here; they are recorded in status by the phase engine.
//! What does arrive is one of:
//!
//! - configuration errors: wait for the resource to change
//! - concurrency conflicts: retry almost immediately against the fresh version
//! - everything else: per-resource Fibonacci backoff

use super::context::{BackoffTracker, Reconciler};
use crate::constants::CONFLICT_REQUEUE_SECS;
use crate::controller::reconciler::phase::write_key;
use crate::controller::reconciler::ReconcilerError;
use crate::crd::ManagedResource;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Delay before the next attempt for `key`, or `None` to wait for a change
pub fn retry_delay(
    backoff: &BackoffTracker,
    key: &str,
    error: &ReconcilerError,
) -> Option<Duration> {
    if error.is_terminal() {
        warn!("Waiting for the resource to change before retrying: {}", error);
        metrics::increment_requeues_total("await-change");
        return None;
    }

    if error.is_conflict() {
        info!("Resource changed during reconciliation, retrying against the latest version");
        metrics::increment_requeues_total("conflict");
        return Some(Duration::from_secs(CONFLICT_REQUEUE_SECS));
    }

    let (delay, error_count) = backoff.next_delay(key);
    let next_trigger_time = chrono::Utc::now()
        + chrono::TimeDelta::from_std(delay).unwrap_or(chrono::TimeDelta::zero());
    info!(
        "Retrying with Fibonacci backoff: {}s (error count: {}, next attempt: {})",
        delay.as_secs(),
        error_count,
        next_trigger_time.to_rfc3339()
    );
    metrics::increment_requeues_total("error-backoff");
    Some(delay)
}

/// Error policy plugged into every controller
pub fn handle_reconciliation_error<K: ManagedResource>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let kind = K::kind(&());
    let key = write_key(obj.as_ref());

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        resource.key = key.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {}", key, error);
    metrics::increment_reconciliation_errors(&kind);

    match retry_delay(&ctx.backoff, &key, error) {
        Some(delay) => Action::requeue(delay),
        None => Action::await_change(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::controller::reconciler::StoreError;

    const KEY: &str = "ArubaVpc/team-a/main";

    #[test]
    fn test_configuration_error_waits_for_change() {
        let backoff = BackoffTracker::new(1, 10);
        let err = ReconcilerError::Configuration("no tenant".to_string());
        assert_eq!(retry_delay(&backoff, KEY, &err), None);
        assert_eq!(backoff.tracked(), 0);
    }

    #[test]
    fn test_conflict_retries_quickly_without_backoff() {
        let backoff = BackoffTracker::new(1, 10);
        let err = ReconcilerError::Persistence(StoreError::Conflict {
            namespace: "team-a".to_string(),
            name: "main".to_string(),
        });
        assert_eq!(
            retry_delay(&backoff, KEY, &err),
            Some(Duration::from_secs(CONFLICT_REQUEUE_SECS))
        );
        assert_eq!(backoff.tracked(), 0);
    }

    #[test]
    fn test_other_errors_back_off() {
        let backoff = BackoffTracker::new(1, 10);
        let err = ReconcilerError::Authentication(AuthError::IdentityProvider(
            "invalid_client".to_string(),
        ));
        assert_eq!(retry_delay(&backoff, KEY, &err), Some(Duration::from_secs(60)));
        assert_eq!(retry_delay(&backoff, KEY, &err), Some(Duration::from_secs(60)));
        assert_eq!(retry_delay(&backoff, KEY, &err), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_timeout_backs_off() {
        let backoff = BackoffTracker::new(1, 10);
        let err = ReconcilerError::Timeout(Duration::from_secs(120));
        assert_eq!(retry_delay(&backoff, KEY, &err), Some(Duration::from_secs(60)));
        assert_eq!(backoff.tracked(), 1);
    }
}
