//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `aruba_operator_reconciliations_total{kind}` - Reconciliations started
//! - `aruba_operator_reconciliation_errors_total{kind}` - Reconciliations that returned an error
//! - `aruba_operator_reconciliation_duration_seconds{kind}` - Duration of reconciliations
//! - `aruba_operator_phase_transitions_total{kind,phase}` - Phase changes written to status
//! - `aruba_operator_debounced_status_writes_total{kind}` - Same-phase writes skipped by the debounce
//! - `aruba_operator_classified_errors_total{kind,class}` - Remote errors by classification
//! - `aruba_operator_requeues_total{reason}` - Requeues decided by the error policy
//! - `aruba_operator_token_cache_hits_total` - Bearer tokens served from cache
//! - `aruba_operator_token_exchanges_total{result}` - Client-credential exchanges
//! - `aruba_operator_api_requests_total{method,status}` - Remote API calls by status class
//! - `aruba_operator_api_request_duration_seconds{method}` - Duration of remote API calls

use anyhow::Result;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aruba_operator_reconciliations_total",
            "Total number of reconciliations",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aruba_operator_reconciliation_errors_total",
            "Total number of reconciliation errors",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "aruba_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static PHASE_TRANSITIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aruba_operator_phase_transitions_total",
            "Total number of phase transitions written to status",
        ),
        &["kind", "phase"],
    )
    .expect("Failed to create PHASE_TRANSITIONS_TOTAL metric - this should never happen")
});

static DEBOUNCED_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aruba_operator_debounced_status_writes_total",
            "Total number of same-phase status writes skipped within the requeue interval",
        ),
        &["kind"],
    )
    .expect("Failed to create DEBOUNCED_WRITES_TOTAL metric - this should never happen")
});

static CLASSIFIED_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aruba_operator_classified_errors_total",
            "Total number of reconciliation errors by classification",
        ),
        &["kind", "class"],
    )
    .expect("Failed to create CLASSIFIED_ERRORS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aruba_operator_requeues_total",
            "Total number of requeues decided by the error policy",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static TOKEN_CACHE_HITS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "aruba_operator_token_cache_hits_total",
        "Total number of bearer tokens served from the cache",
    )
    .expect("Failed to create TOKEN_CACHE_HITS_TOTAL metric - this should never happen")
});

static TOKEN_EXCHANGES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aruba_operator_token_exchanges_total",
            "Total number of client-credential exchanges with the identity provider",
        ),
        &["result"],
    )
    .expect("Failed to create TOKEN_EXCHANGES_TOTAL metric - this should never happen")
});

static API_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aruba_operator_api_requests_total",
            "Total number of remote API requests",
        ),
        &["method", "status"],
    )
    .expect("Failed to create API_REQUESTS_TOTAL metric - this should never happen")
});

static API_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "aruba_operator_api_request_duration_seconds",
            "Duration of remote API requests in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method"],
    )
    .expect("Failed to create API_REQUEST_DURATION metric - this should never happen")
});

/// Register every metric with the shared registry
///
/// # Errors
///
/// Returns an error if a metric is registered twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(PHASE_TRANSITIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DEBOUNCED_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CLASSIFIED_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TOKEN_CACHE_HITS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TOKEN_EXCHANGES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(API_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(API_REQUEST_DURATION.clone()))?;

    Ok(())
}

/// Text exposition of everything in the registry, for the `/metrics` endpoint
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn gather() -> Result<String> {
    use prometheus::Encoder;

    let mut buffer = Vec::new();
    prometheus::TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

pub fn increment_phase_transitions(kind: &str, phase: &str) {
    PHASE_TRANSITIONS_TOTAL
        .with_label_values(&[kind, phase])
        .inc();
}

pub fn increment_debounced_writes(kind: &str) {
    DEBOUNCED_WRITES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_classified_errors(kind: &str, class: &str) {
    CLASSIFIED_ERRORS_TOTAL
        .with_label_values(&[kind, class])
        .inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_token_cache_hits() {
    TOKEN_CACHE_HITS_TOTAL.inc();
}

pub fn increment_token_exchanges(result: &str) {
    TOKEN_EXCHANGES_TOTAL.with_label_values(&[result]).inc();
}

/// Record one remote API call; `status` is a class such as `2xx` or `error`
pub fn record_api_request(method: &str, status: &str, duration: f64) {
    API_REQUESTS_TOTAL
        .with_label_values(&[method, status])
        .inc();
    API_REQUEST_DURATION
        .with_label_values(&[method])
        .observe(duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // Only this test registers, so a second registration must fail
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_err());
        let text = gather().unwrap();
        assert!(text.contains("aruba_operator_token_cache_hits_total"));
    }

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.with_label_values(&["ArubaVpc"]).get();
        increment_reconciliations("ArubaVpc");
        let after = RECONCILIATIONS_TOTAL.with_label_values(&["ArubaVpc"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["ArubaSubnet"])
            .get();
        increment_reconciliation_errors("ArubaSubnet");
        let after = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["ArubaSubnet"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION
            .with_label_values(&["ArubaProject"])
            .get_sample_count();
        observe_reconciliation_duration("ArubaProject", 0.4);
        let after = RECONCILIATION_DURATION
            .with_label_values(&["ArubaProject"])
            .get_sample_count();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_phase_transitions_are_labelled_by_phase() {
        let before = PHASE_TRANSITIONS_TOTAL
            .with_label_values(&["ArubaKeyPair", "Created"])
            .get();
        increment_phase_transitions("ArubaKeyPair", "Created");
        let after = PHASE_TRANSITIONS_TOTAL
            .with_label_values(&["ArubaKeyPair", "Created"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_debounced_writes() {
        let before = DEBOUNCED_WRITES_TOTAL
            .with_label_values(&["ArubaBlockStorage"])
            .get();
        increment_debounced_writes("ArubaBlockStorage");
        let after = DEBOUNCED_WRITES_TOTAL
            .with_label_values(&["ArubaBlockStorage"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_classified_errors() {
        let before = CLASSIFIED_ERRORS_TOTAL
            .with_label_values(&["ArubaCloudServer", "fail_terminal"])
            .get();
        increment_classified_errors("ArubaCloudServer", "fail_terminal");
        let after = CLASSIFIED_ERRORS_TOTAL
            .with_label_values(&["ArubaCloudServer", "fail_terminal"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_token_metrics() {
        let hits = TOKEN_CACHE_HITS_TOTAL.get();
        let exchanges = TOKEN_EXCHANGES_TOTAL.with_label_values(&["success"]).get();
        increment_token_cache_hits();
        increment_token_exchanges("success");
        assert_eq!(TOKEN_CACHE_HITS_TOTAL.get(), hits + 1u64);
        assert_eq!(
            TOKEN_EXCHANGES_TOTAL.with_label_values(&["success"]).get(),
            exchanges + 1u64
        );
    }

    #[test]
    fn test_record_api_request() {
        let before = API_REQUESTS_TOTAL.with_label_values(&["PUT", "5xx"]).get();
        record_api_request("PUT", "5xx", 0.3);
        let after = API_REQUESTS_TOTAL.with_label_values(&["PUT", "5xx"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_requeues_total() {
        let before = REQUEUES_TOTAL.with_label_values(&["conflict"]).get();
        increment_requeues_total("conflict");
        let after = REQUEUES_TOTAL.with_label_values(&["conflict"]).get();
        assert_eq!(after, before + 1u64);
    }
}
