//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// API group of every Aruba custom resource
pub const API_GROUP: &str = "cloud.aruba.it";

/// Condition type carried by every Aruba resource status
pub const CONDITION_TYPE_SYNCHRONIZED: &str = "Synchronized";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Fixed requeue interval used by phase transitions (seconds)
/// Also the debounce window for repeated same-phase status writes
pub const DEFAULT_REQUEUE_INTERVAL_SECS: u64 = 20;

/// Maximum time a resource may stay in Creating, Provisioning or Updating (seconds)
pub const DEFAULT_PHASE_TIMEOUT_SECS: u64 = 300;

/// Periodic resync for resources that asked for no requeue (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 600;

/// Deadline for a single reconciliation, including every remote call it makes (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 120;

/// Timeout for individual HTTP requests to the cloud API, Keycloak and Vault (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Fibonacci backoff lower bound for propagated reconciliation errors (minutes)
pub const DEFAULT_ERROR_BACKOFF_MIN_MINUTES: u64 = 1;

/// Fibonacci backoff upper bound for propagated reconciliation errors (minutes)
pub const DEFAULT_ERROR_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default number of reconciliations run concurrently per resource kind
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Safety margin applied before an access token's real expiry (seconds)
pub const TOKEN_EXPIRY_SAFETY_MARGIN_SECS: i64 = 10;

/// Default Vault auth mount for AppRole logins
pub const DEFAULT_VAULT_ROLE_PATH: &str = "approle";

/// Default Vault KV v2 mount holding tenant API keys
pub const DEFAULT_VAULT_KV_MOUNT: &str = "secret";

/// Secret key holding the tenant's OAuth client id
pub const SECRET_KEY_CLIENT_ID: &str = "client-id";

/// Secret key holding the tenant's OAuth client secret
pub const SECRET_KEY_CLIENT_SECRET: &str = "client-secret";

/// Delay before retrying a pass that lost an optimistic concurrency race (seconds)
pub const CONFLICT_REQUEUE_SECS: u64 = 1;
