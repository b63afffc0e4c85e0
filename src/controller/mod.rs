//! # Controller
//!
//! Core controller modules for the Aruba resource operator.
//!
//! - `backoff`: Fibonacci backoff for propagated reconciliation errors
//! - `reconciler`: Phase engine, dependency resolution and error classification
//! - `resources`: Remote create/read/update/delete per resource kind
//! - `server`: HTTP server for metrics and health checks
//!
//! The `crdgen` binary lives next to these modules but is built separately.

pub mod backoff;
pub mod reconciler;
pub mod resources;
pub mod server;
