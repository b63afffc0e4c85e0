//! # Configuration
//!
//! Operator settings loaded from environment variables.

mod controller;

pub use controller::{ConfigError, ControllerConfig};
