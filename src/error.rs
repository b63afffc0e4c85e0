//! Error types for the Aruba resource operator
//!
//! [`Error`] is what phase callbacks and the dependency resolver return; the phase manager
//! hands it to the error classifier. [`ApiError`] is the structured error of the remote
//! Aruba Cloud API.

use crate::auth::AuthError;
use crate::controller::reconciler::StoreError;
use serde::Deserialize;
use thiserror::Error;

/// Error raised while reconciling one resource against the remote API
#[derive(Debug, Error)]
pub enum Error {
    /// Remote API answered with an error status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Referenced object does not exist in the cluster
    #[error("failed to get referenced {kind} {namespace}/{name}")]
    ReferenceNotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// Referenced object exists but has not been created remotely yet
    #[error("referenced {kind} {namespace}/{name} does not have a resource ID yet")]
    DependencyNotReady {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        #[from]
        source: kube::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Connection, timeout or decoding failure talking to the remote API
    #[error("transport error: {0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn reference_not_found(
        kind: &'static str,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::ReferenceNotFound {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn dependency_not_ready(
        kind: &'static str,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::DependencyNotReady {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Remote API error carried by this error, if any
    #[must_use]
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(api) => Some(api),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}

/// Error response of the Aruba Cloud API
///
/// The API reports a resource that exists but is still transitioning (for example updating a
/// volume while it is being attached) with an "invalid status" / "not ready" problem type.
/// That marker is kept separately from the numeric status because it changes how the error
/// is handled, whatever the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub title: String,
    pub detail: String,
    invalid_status: bool,
}

/// RFC 7807 style problem body
#[derive(Debug, Default, Deserialize)]
struct ProblemBody {
    #[serde(default, rename = "type")]
    problem_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

const INVALID_STATUS_MARKERS: [&str; 2] = ["invalidstatus", "notready"];

impl ApiError {
    pub fn new(status: u16, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            detail: detail.into(),
            invalid_status: false,
        }
    }

    /// Error for a remote resource that is not in a state accepting the operation yet
    pub fn with_invalid_status(
        status: u16,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            invalid_status: true,
            ..Self::new(status, title, detail)
        }
    }

    /// Build from a non-success response body
    ///
    /// Bodies that are not problem JSON are kept verbatim as the detail.
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        let problem = serde_json::from_str::<ProblemBody>(body).unwrap_or_default();
        let invalid_status = [&problem.problem_type, &problem.title, &problem.detail]
            .into_iter()
            .flatten()
            .any(|field| carries_invalid_status_marker(field));

        let detail = match problem.detail {
            Some(detail) => detail,
            None if problem.title.is_none() => body.trim().to_string(),
            None => String::new(),
        };

        Self {
            status,
            title: problem.title.unwrap_or_default(),
            detail,
            invalid_status,
        }
    }

    /// Remote resource exists but is transitioning
    #[must_use]
    pub fn is_invalid_status(&self) -> bool {
        self.invalid_status
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    fn describe(&self) -> String {
        match (self.title.is_empty(), self.detail.is_empty()) {
            (false, false) => format!("{}: {}", self.title, self.detail),
            (false, true) => self.title.clone(),
            (true, false) => self.detail.clone(),
            (true, true) => "no details".to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "remote API error {}: {}", self.status, self.describe())
    }
}

impl std::error::Error for ApiError {}

fn carries_invalid_status_marker(field: &str) -> bool {
    let normalized: String = field
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    INVALID_STATUS_MARKERS
        .iter()
        .any(|marker| normalized.contains(marker))
}
