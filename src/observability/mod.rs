//! # Observability
//!
//! - `metrics`: Prometheus metrics collection
//!
//! Logging goes through `tracing`; the subscriber is installed once at startup.

pub mod metrics;
