//! # Error Classification
//!
//! The one place failure policy is decided. Every phase handler hands its failure to
//! [`classify`] through the phase manager, so all resource kinds react to the same error
//! the same way.

use crate::error::Error;

/// What a failed phase callback leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Something is still transitioning; stay in the phase and poll again
    RetrySamePhase,
    /// Will not resolve by itself; move to Failed and stop requeuing
    FailTerminal,
    /// Transient; stay in the phase and retry after the requeue interval
    RetryWithBackoff,
}

impl ErrorClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::RetrySamePhase => "retry_same_phase",
            ErrorClass::FailTerminal => "fail_terminal",
            ErrorClass::RetryWithBackoff => "retry_with_backoff",
        }
    }
}

/// Map an error onto its failure policy
///
/// The invalid-status marker wins over the status code. Errors without an HTTP status
/// (transport failures, missing references, store errors) are treated as transient.
#[must_use]
pub fn classify(err: &Error) -> ErrorClass {
    match err {
        Error::Api(api) if api.is_invalid_status() => ErrorClass::RetrySamePhase,
        Error::Api(api) if api.is_client_error() => ErrorClass::FailTerminal,
        Error::DependencyNotReady { .. } => ErrorClass::RetrySamePhase,
        _ => ErrorClass::RetryWithBackoff,
    }
}
