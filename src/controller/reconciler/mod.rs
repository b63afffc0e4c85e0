//! # Reconciler
//!
//! Phase-driven reconciliation engine shared by every Aruba kind.
//!
//! A resource moves through `Creating → Provisioning → Created ⇄ Updating`, ends in
//! `Deleting` once deletion is requested, and lands in `Failed` on terminal errors or when a
//! transitioning phase runs past the phase timeout. The phase is stored in the resource
//! status, so a pass can resume wherever the previous one stopped.
//!
//! ## Modules
//!
//! - `dispatcher`: one reconciliation pass (load, authenticate, dispatch on phase)
//! - `phase`: phase manager (transitions, debounce, timeout, deletion)
//! - `strategy`: per-kind contract and default phase handlers
//! - `classify`: failure policy for remote errors
//! - `resolver`: references to remote identifiers
//! - `volumes`: data volume attach/detach diff
//! - `conditions`: status condition upsert
//! - `store`: resource store access with optimistic concurrency
//! - `types`: errors, requeue directive, backoff state

pub mod classify;
pub mod conditions;
pub mod dispatcher;
pub mod phase;
pub mod resolver;
pub mod store;
pub mod strategy;
pub mod types;
pub mod volumes;

pub use classify::{classify, ErrorClass};
pub use dispatcher::{Dispatcher, EngineContext};
pub use phase::{next_allowed_time, PhaseManager, RemoteCreated, WriteTracker};
pub use resolver::{DependencyResolver, KubeLookup, ReferenceKind, ReferenceLookup};
pub use store::{KubeStore, ResourceStore, StoreError};
pub use strategy::{Drift, Reconcilable, RemoteContext};
pub use types::{BackoffState, EngineSettings, ReconcilerError, Requeue};
