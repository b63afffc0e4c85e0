//! # Initialization
//!
//! Operator startup: rustls provider, tracing, configuration, metrics, probe server,
//! Kubernetes client and the shared reconciler context.

use super::context::Reconciler;
use crate::auth::{KeycloakClient, TokenManager, VaultClient, VaultSettings};
use crate::client::HttpTransport;
use crate::clock::{Clock, SystemClock};
use crate::config::ControllerConfig;
use crate::constants::{DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS};
use crate::controller::reconciler::{EngineContext, EngineSettings, KubeLookup};
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use zeroize::Zeroizing;

/// Everything the watch loop needs
pub struct InitializationResult {
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Initialize the operator runtime
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the probe server cannot start, or no
/// Kubernetes client can be built.
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything opens a TLS connection
    let provider_already_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_err();

    let config = ControllerConfig::from_env();
    init_tracing(&config.log_format);
    if provider_already_installed {
        warn!("rustls crypto provider was already installed, keeping the existing one");
    }

    info!("Starting Aruba resource operator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    config.validate().context("Invalid operator configuration")?;
    info!("Configuration: {:?}", config);

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = Arc::clone(&server_state);
    let server_port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(
        &server_state,
        &server_handle,
        Duration::from_secs(DEFAULT_SERVER_STARTUP_TIMEOUT_SECS),
        Duration::from_millis(DEFAULT_SERVER_POLL_INTERVAL_MS),
    )
    .await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let identity = Arc::new(KeycloakClient::new(http.clone(), config.keycloak_url.clone()));
    let secrets = Arc::new(VaultClient::new(
        http.clone(),
        vault_settings(&config),
        Arc::clone(&clock),
    ));
    let tokens = Arc::new(TokenManager::new(
        identity,
        secrets,
        config.keycloak_realm.clone(),
        Arc::clone(&clock),
    ));
    let transport = Arc::new(HttpTransport::new(http, config.api_gateway.clone()));
    let lookup = Arc::new(KubeLookup::new(client.clone()));

    let engine = Arc::new(EngineContext::new(
        tokens,
        transport,
        lookup,
        clock,
        engine_settings(&config),
    ));
    let reconciler = Arc::new(Reconciler::new(client, engine, &config));

    info!("Operator initialized, starting watch loop...");

    Ok(InitializationResult {
        reconciler,
        server_state,
        config,
    })
}

/// Install the global subscriber; `json` or anything else for plain text
fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aruba_resource_operator=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if log_format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        warn!("Tracing subscriber already initialized: {}", e);
    }
}

fn vault_settings(config: &ControllerConfig) -> VaultSettings {
    VaultSettings {
        address: config.vault_address.clone(),
        namespace: config.vault_namespace.clone(),
        role_path: config.vault_role_path.clone(),
        role_id: config.vault_role_id.clone(),
        role_secret: Zeroizing::new(config.vault_role_secret.clone()),
        kv_mount: config.vault_kv_mount.clone(),
    }
}

fn engine_settings(config: &ControllerConfig) -> EngineSettings {
    EngineSettings {
        requeue_interval: config.requeue_interval(),
        phase_timeout: config.phase_timeout(),
    }
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &tokio::task::JoinHandle<()>,
    startup_timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let start_time = Instant::now();

    loop {
        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_settings_follow_config() {
        let config = ControllerConfig {
            requeue_interval_secs: 5,
            phase_timeout_secs: 60,
            ..ControllerConfig::default()
        };
        let settings = engine_settings(&config);
        assert_eq!(settings.requeue_interval, Duration::from_secs(5));
        assert_eq!(settings.phase_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_vault_settings_carry_role_secret() {
        let config = ControllerConfig {
            vault_role_secret: "role-secret".to_string(),
            vault_namespace: "tenants".to_string(),
            ..ControllerConfig::default()
        };
        let settings = vault_settings(&config);
        assert_eq!(settings.role_secret.as_str(), "role-secret");
        assert_eq!(settings.namespace, "tenants");
        assert_eq!(settings.role_path, "approle");
    }

    #[tokio::test]
    async fn test_wait_for_server_ready_returns_once_ready() {
        let state = Arc::new(ServerState::default());
        let flag = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.set_ready(true);
            std::future::pending::<()>().await;
        });

        let result = wait_for_server_ready(
            &state,
            &handle,
            Duration::from_secs(5),
            Duration::from_millis(5),
        )
        .await;
        assert!(result.is_ok());
        handle.abort();
    }

    #[tokio::test]
    async fn test_wait_for_server_ready_fails_when_server_exits() {
        let state = ServerState::default();
        let handle = tokio::spawn(async {});
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = wait_for_server_ready(
            &state,
            &handle,
            Duration::from_secs(5),
            Duration::from_millis(5),
        )
        .await;
        assert!(result.is_err());
    }
}
