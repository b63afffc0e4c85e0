//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;
use thiserror::Error;

/// Rejected configuration value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required setting {0} is empty")]
    Missing(&'static str),
    #[error("setting {0} must be greater than zero")]
    Zero(&'static str),
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap and a Secret using `envFrom` in the deployment.
#[derive(Clone)]
pub struct ControllerConfig {
    /// Base URL of the Aruba Cloud REST API gateway
    pub api_gateway: String,
    /// Keycloak base URL used for client-credentials exchanges
    pub keycloak_url: String,
    /// Keycloak realm holding tenant API clients
    pub keycloak_realm: String,
    /// Vault address
    pub vault_address: String,
    /// Vault enterprise namespace (empty for none)
    pub vault_namespace: String,
    /// Vault auth mount used for the AppRole login
    pub vault_role_path: String,
    /// AppRole role id
    pub vault_role_id: String,
    /// AppRole secret id
    pub vault_role_secret: String,
    /// KV v2 mount holding one secret per tenant
    pub vault_kv_mount: String,
    /// Port for the metrics and probe server
    pub metrics_port: u16,
    /// Fixed requeue interval after a phase transition (seconds)
    /// Repeated same-phase writes are debounced to one per interval
    pub requeue_interval_secs: u64,
    /// Ceiling for Creating, Provisioning and Updating before a forced Failed (seconds)
    pub phase_timeout_secs: u64,
    /// Resync interval for resources that need no active requeue (seconds)
    pub resync_interval_secs: u64,
    /// Deadline for a single reconciliation (seconds)
    pub reconcile_timeout_secs: u64,
    /// Timeout for each outbound HTTP request (seconds)
    pub http_timeout_secs: u64,
    /// Fibonacci backoff minimum for propagated errors (minutes)
    pub error_backoff_min_minutes: u64,
    /// Fibonacci backoff maximum for propagated errors (minutes)
    pub error_backoff_max_minutes: u64,
    /// Maximum concurrent reconciliations per resource kind
    pub max_concurrent_reconciliations: u16,
    /// Log format (json, text)
    pub log_format: String,
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("api_gateway", &self.api_gateway)
            .field("keycloak_url", &self.keycloak_url)
            .field("keycloak_realm", &self.keycloak_realm)
            .field("vault_address", &self.vault_address)
            .field("vault_namespace", &self.vault_namespace)
            .field("vault_role_path", &self.vault_role_path)
            .field("vault_role_id", &self.vault_role_id)
            .field("vault_role_secret", &"***")
            .field("vault_kv_mount", &self.vault_kv_mount)
            .field("metrics_port", &self.metrics_port)
            .field("requeue_interval_secs", &self.requeue_interval_secs)
            .field("phase_timeout_secs", &self.phase_timeout_secs)
            .field("resync_interval_secs", &self.resync_interval_secs)
            .field("reconcile_timeout_secs", &self.reconcile_timeout_secs)
            .field("max_concurrent_reconciliations", &self.max_concurrent_reconciliations)
            .finish_non_exhaustive()
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            api_gateway: String::new(),
            keycloak_url: String::new(),
            keycloak_realm: String::new(),
            vault_address: String::new(),
            vault_namespace: String::new(),
            vault_role_path: DEFAULT_VAULT_ROLE_PATH.to_string(),
            vault_role_id: String::new(),
            vault_role_secret: String::new(),
            vault_kv_mount: DEFAULT_VAULT_KV_MOUNT.to_string(),
            metrics_port: DEFAULT_METRICS_PORT,
            requeue_interval_secs: DEFAULT_REQUEUE_INTERVAL_SECS,
            phase_timeout_secs: DEFAULT_PHASE_TIMEOUT_SECS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            reconcile_timeout_secs: DEFAULT_RECONCILE_TIMEOUT_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            error_backoff_min_minutes: DEFAULT_ERROR_BACKOFF_MIN_MINUTES,
            error_backoff_max_minutes: DEFAULT_ERROR_BACKOFF_MAX_MINUTES,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            api_gateway: env_var_or_default_str("API_GATEWAY", ""),
            keycloak_url: env_var_or_default_str("KEYCLOAK_URL", ""),
            keycloak_realm: env_var_or_default_str("KEYCLOAK_REALM", ""),
            vault_address: env_var_or_default_str("VAULT_ADDRESS", ""),
            vault_namespace: env_var_or_default_str("VAULT_NAMESPACE", ""),
            vault_role_path: env_var_or_default_str("VAULT_ROLE_PATH", DEFAULT_VAULT_ROLE_PATH),
            vault_role_id: env_var_or_default_str("VAULT_ROLE_ID", ""),
            vault_role_secret: env_var_or_default_str("VAULT_ROLE_SECRET", ""),
            vault_kv_mount: env_var_or_default_str("VAULT_KV_MOUNT", DEFAULT_VAULT_KV_MOUNT),
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            requeue_interval_secs: env_var_or_default(
                "REQUEUE_INTERVAL_SECS",
                DEFAULT_REQUEUE_INTERVAL_SECS,
            ),
            phase_timeout_secs: env_var_or_default("PHASE_TIMEOUT_SECS", DEFAULT_PHASE_TIMEOUT_SECS),
            resync_interval_secs: env_var_or_default(
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            reconcile_timeout_secs: env_var_or_default(
                "RECONCILE_TIMEOUT_SECS",
                DEFAULT_RECONCILE_TIMEOUT_SECS,
            ),
            http_timeout_secs: env_var_or_default("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
            error_backoff_min_minutes: env_var_or_default(
                "ERROR_BACKOFF_MIN_MINUTES",
                DEFAULT_ERROR_BACKOFF_MIN_MINUTES,
            ),
            error_backoff_max_minutes: env_var_or_default(
                "ERROR_BACKOFF_MAX_MINUTES",
                DEFAULT_ERROR_BACKOFF_MAX_MINUTES,
            ),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            log_format: env_var_or_default_str("LOG_FORMAT", "json"),
        }
    }

    /// Reject settings the operator cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("API_GATEWAY", &self.api_gateway),
            ("KEYCLOAK_URL", &self.keycloak_url),
            ("KEYCLOAK_REALM", &self.keycloak_realm),
            ("VAULT_ADDRESS", &self.vault_address),
            ("VAULT_ROLE_ID", &self.vault_role_id),
            ("VAULT_ROLE_SECRET", &self.vault_role_secret),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Missing(*name));
        }

        let intervals = [
            ("REQUEUE_INTERVAL_SECS", self.requeue_interval_secs),
            ("PHASE_TIMEOUT_SECS", self.phase_timeout_secs),
            ("RESYNC_INTERVAL_SECS", self.resync_interval_secs),
            ("RECONCILE_TIMEOUT_SECS", self.reconcile_timeout_secs),
            ("HTTP_TIMEOUT_SECS", self.http_timeout_secs),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero(*name));
        }
        if self.max_concurrent_reconciliations == 0 {
            return Err(ConfigError::Zero("MAX_CONCURRENT_RECONCILIATIONS"));
        }
        Ok(())
    }

    pub fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_interval_secs)
    }

    pub fn phase_timeout(&self) -> Duration {
        Duration::from_secs(self.phase_timeout_secs)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ControllerConfig {
        ControllerConfig {
            api_gateway: "https://api.example.test".to_string(),
            keycloak_url: "https://login.example.test".to_string(),
            keycloak_realm: "tenants".to_string(),
            vault_address: "https://vault.example.test".to_string(),
            vault_role_id: "role".to_string(),
            vault_role_secret: "s3cr3t-value".to_string(),
            ..ControllerConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_reference_timings() {
        let config = ControllerConfig::default();
        assert_eq!(config.requeue_interval(), Duration::from_secs(20));
        assert_eq!(config.phase_timeout(), Duration::from_secs(300));
        assert_eq!(config.vault_role_path, "approle");
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert_eq!(complete().validate(), Ok(()));
    }

    #[test]
    fn test_validate_reports_first_missing_endpoint() {
        let config = ControllerConfig {
            keycloak_url: "  ".to_string(),
            ..complete()
        };
        assert_eq!(config.validate(), Err(ConfigError::Missing("KEYCLOAK_URL")));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = ControllerConfig {
            requeue_interval_secs: 0,
            ..complete()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero("REQUEUE_INTERVAL_SECS"))
        );
    }

    #[test]
    fn test_debug_redacts_role_secret() {
        let rendered = format!("{:?}", complete());
        assert!(!rendered.contains("s3cr3t-value"));
        assert!(rendered.contains("***"));
    }
}
