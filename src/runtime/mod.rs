//! # Runtime
//!
//! Controller runtime wiring: startup, one watch per kind, and the error policy.
//!
//! - `initialization`: tracing, configuration, metrics, probe server and client setup
//! - `context`: reconciler context shared by every controller
//! - `watch_loop`: one `kube_runtime::Controller` per Aruba kind
//! - `error_policy`: requeue decisions for failed reconciliations

pub mod context;
pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use context::{BackoffTracker, Reconciler};
