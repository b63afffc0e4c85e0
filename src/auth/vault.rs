use super::AuthError;
use crate::clock::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Source of tenant API client credentials
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Secret data for `tenant`, containing at least `client-id` and `client-secret`
    async fn get_secret(&self, tenant: &str) -> Result<HashMap<String, String>, AuthError>;
}

/// Vault connection settings
#[derive(Clone)]
pub struct VaultSettings {
    pub address: String,
    /// Enterprise namespace, empty for none
    pub namespace: String,
    pub role_path: String,
    pub role_id: String,
    pub role_secret: Zeroizing<String>,
    pub kv_mount: String,
}

impl std::fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSettings")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("role_path", &self.role_path)
            .field("role_id", &self.role_id)
            .field("role_secret", &"***")
            .field("kv_mount", &self.kv_mount)
            .finish()
    }
}

struct VaultToken {
    token: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
    #[serde(default)]
    lease_duration: i64,
}

#[derive(Deserialize)]
struct KvV2Response {
    data: KvV2Data,
}

#[derive(Deserialize)]
struct KvV2Data {
    #[serde(default)]
    data: HashMap<String, Value>,
}

/// Vault client authenticating with AppRole and reading tenant secrets from KV v2
pub struct VaultClient {
    http: reqwest::Client,
    settings: VaultSettings,
    clock: Arc<dyn Clock>,
    token: AsyncMutex<Option<VaultToken>>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    pub fn new(http: reqwest::Client, settings: VaultSettings, clock: Arc<dyn Clock>) -> Self {
        let address = settings.address.trim_end_matches('/').to_string();
        Self {
            http,
            settings: VaultSettings {
                address,
                ..settings
            },
            clock,
            token: AsyncMutex::new(None),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}/v1/{}", self.settings.address, path));
        if self.settings.namespace.is_empty() {
            builder
        } else {
            builder.header("X-Vault-Namespace", &self.settings.namespace)
        }
    }

    /// Client token, logging in again when the lease is about to run out
    async fn client_token(&self) -> Result<Zeroizing<String>, AuthError> {
        let mut cached = self.token.lock().await;
        let now = self.clock.now();
        if let Some(token) = cached.as_ref().filter(|t| now < t.expires_at) {
            return Ok(token.token.clone());
        }

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("auth/{}/login", self.settings.role_path),
            )
            .json(&serde_json::json!({
                "role_id": self.settings.role_id,
                "secret_id": self.settings.role_secret.as_str(),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::SecretStore(format!(
                "AppRole login at {} failed with {status}",
                self.settings.role_path
            )));
        }

        let login: LoginResponse = response.json().await?;
        // Renew a little before the lease ends; a zero lease means the token does not expire.
        let lease = if login.auth.lease_duration > 0 {
            Duration::seconds(login.auth.lease_duration) * 9 / 10
        } else {
            Duration::days(365)
        };
        info!(
            lease_seconds = login.auth.lease_duration,
            "Authenticated to Vault with AppRole"
        );

        let token = Zeroizing::new(login.auth.client_token);
        *cached = Some(VaultToken {
            token: token.clone(),
            expires_at: now + lease,
        });
        Ok(token)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }
}

/// KV v2 data path of a tenant secret
///
/// Anything that could step out of the tenant's own secret is rejected: separators,
/// dot segments, URL delimiters and escapes, whitespace and control characters.
fn kv_data_path(mount: &str, tenant: &str) -> Result<String, AuthError> {
    let invalid = tenant.is_empty()
        || tenant == "."
        || tenant == ".."
        || tenant.chars().any(|c| {
            matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control()
        });
    if invalid {
        return Err(AuthError::InvalidTenant(tenant.to_string()));
    }
    Ok(format!("{mount}/data/{tenant}"))
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn get_secret(&self, tenant: &str) -> Result<HashMap<String, String>, AuthError> {
        let path = kv_data_path(&self.settings.kv_mount, tenant)?;
        let token = self.client_token().await?;
        debug!(tenant = tenant, "vault.kv.read");

        let response = self
            .request(reqwest::Method::GET, &path)
            .header("X-Vault-Token", token.as_str())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            // Revoked or expired token; the next call logs in again
            warn!(tenant = tenant, "Vault rejected the client token");
            self.forget_token().await;
        }
        if !status.is_success() {
            return Err(AuthError::SecretStore(format!(
                "reading secret for tenant {tenant} failed with {status}"
            )));
        }

        let body: KvV2Response = response.json().await?;
        Ok(body
            .data
            .data
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// One KV read as the mock Vault saw it
    #[derive(Debug, Clone)]
    struct KvRead {
        tenant: String,
        token: Option<String>,
        namespace: Option<String>,
    }

    #[derive(Default)]
    struct MockVault {
        logins: AtomicUsize,
        login_bodies: Mutex<Vec<Value>>,
        reads: Mutex<Vec<KvRead>>,
        reject_reads: AtomicBool,
    }

    impl MockVault {
        fn logins(&self) -> usize {
            self.logins.load(Ordering::SeqCst)
        }

        fn reads(&self) -> Vec<KvRead> {
            self.reads.lock().unwrap().clone()
        }
    }

    fn header(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn login(State(vault): State<Arc<MockVault>>, Json(body): Json<Value>) -> Json<Value> {
        let n = vault.logins.fetch_add(1, Ordering::SeqCst) + 1;
        vault.login_bodies.lock().unwrap().push(body);
        Json(json!({
            "auth": { "client_token": format!("s.token-{n}"), "lease_duration": 3600 }
        }))
    }

    async fn read_secret(
        State(vault): State<Arc<MockVault>>,
        Path(tenant): Path<String>,
        headers: HeaderMap,
    ) -> Response {
        vault.reads.lock().unwrap().push(KvRead {
            tenant,
            token: header(&headers, "X-Vault-Token"),
            namespace: header(&headers, "X-Vault-Namespace"),
        });
        if vault.reject_reads.load(Ordering::SeqCst) {
            return StatusCode::FORBIDDEN.into_response();
        }
        Json(json!({
            "data": {
                "data": { "client-id": "client-a", "client-secret": "secret-a", "rotation": 3 },
                "metadata": { "version": 3 }
            }
        }))
        .into_response()
    }

    /// Serve a mock Vault on a random local port, returning its address
    async fn serve(vault: Arc<MockVault>) -> String {
        let app = Router::new()
            .route("/v1/auth/approle/login", post(login))
            .route("/v1/secret/data/{tenant}", get(read_secret))
            .with_state(vault);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn settings(address: String, namespace: &str) -> VaultSettings {
        VaultSettings {
            address,
            namespace: namespace.to_string(),
            role_path: "approle".to_string(),
            role_id: "operator".to_string(),
            role_secret: Zeroizing::new("role-secret".to_string()),
            kv_mount: "secret".to_string(),
        }
    }

    async fn client(namespace: &str) -> (VaultClient, Arc<MockVault>, Arc<ManualClock>) {
        let vault = Arc::new(MockVault::default());
        let address = serve(Arc::clone(&vault)).await;
        let clock = Arc::new(ManualClock::at("2025-03-01T10:00:00Z"));
        let client = VaultClient::new(
            reqwest::Client::new(),
            settings(address, namespace),
            clock.clone(),
        );
        (client, vault, clock)
    }

    #[test]
    fn test_kv_data_path_accepts_plain_tenants() {
        assert_eq!(kv_data_path("secret", "ARU-123456").unwrap(), "secret/data/ARU-123456");
        assert_eq!(kv_data_path("kv", "tenant.a_b").unwrap(), "kv/data/tenant.a_b");
    }

    #[test]
    fn test_kv_data_path_rejects_path_tricks() {
        for tenant in ["", ".", "..", "../other", "a/b", "a\\b", "a?version=1", "a#b", "a%2Fb", "a b"] {
            assert!(
                matches!(kv_data_path("secret", tenant), Err(AuthError::InvalidTenant(_))),
                "{tenant:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_login_then_read_flattens_kv_values() {
        let (client, vault, _clock) = client("tenants").await;

        let secret = client.get_secret("ARU-1").await.unwrap();
        assert_eq!(secret.get("client-id").map(String::as_str), Some("client-a"));
        assert_eq!(secret.get("client-secret").map(String::as_str), Some("secret-a"));
        assert_eq!(secret.get("rotation").map(String::as_str), Some("3"));

        assert_eq!(vault.logins(), 1);
        let body = vault.login_bodies.lock().unwrap()[0].clone();
        assert_eq!(body["role_id"], "operator");
        assert_eq!(body["secret_id"], "role-secret");

        let reads = vault.reads();
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].tenant, "ARU-1");
        assert_eq!(reads[0].token.as_deref(), Some("s.token-1"));
        assert_eq!(reads[0].namespace.as_deref(), Some("tenants"));
    }

    #[tokio::test]
    async fn test_namespace_header_omitted_when_unset() {
        let (client, vault, _clock) = client("").await;

        client.get_secret("ARU-1").await.unwrap();
        assert_eq!(vault.reads()[0].namespace, None);
    }

    #[tokio::test]
    async fn test_client_token_reused_until_lease_runs_out() {
        let (client, vault, clock) = client("").await;

        client.get_secret("ARU-1").await.unwrap();
        clock.advance(Duration::minutes(30));
        client.get_secret("ARU-2").await.unwrap();
        assert_eq!(vault.logins(), 1);

        // renewed at 90% of the one hour lease
        clock.advance(Duration::minutes(25));
        client.get_secret("ARU-1").await.unwrap();
        assert_eq!(vault.logins(), 2);
        assert_eq!(vault.reads()[2].token.as_deref(), Some("s.token-2"));
    }

    #[tokio::test]
    async fn test_forbidden_read_forgets_client_token() {
        let (client, vault, _clock) = client("").await;
        vault.reject_reads.store(true, Ordering::SeqCst);

        let err = client.get_secret("ARU-1").await.unwrap_err();
        assert!(matches!(err, AuthError::SecretStore(_)));
        assert_eq!(vault.logins(), 1);

        vault.reject_reads.store(false, Ordering::SeqCst);
        client.get_secret("ARU-1").await.unwrap();
        assert_eq!(vault.logins(), 2);
        assert_eq!(vault.reads()[1].token.as_deref(), Some("s.token-2"));
    }

    #[tokio::test]
    async fn test_invalid_tenant_never_reaches_vault() {
        let (client, vault, _clock) = client("").await;

        let err = client.get_secret("../ARU-2").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidTenant(_)));
        assert_eq!(vault.logins(), 0);
        assert!(vault.reads().is_empty());
    }
}
