//! Aruba Resource Operator Library
//!
//! Reconciliation engine and controller runtime for Aruba Cloud custom resources.
//! Tests live next to the code in each module, with integration tests under `tests/`.
//!
//! - `auth`: per-tenant bearer tokens (Vault credentials, Keycloak exchange, cache)
//! - `client`: Aruba Cloud REST client
//! - `crd`: the nine resource kinds and their shared status
//! - `controller`: phase engine, per-kind strategies, probe server
//! - `runtime`: startup and one controller per kind

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod runtime;
