use super::{AuthError, ClientCredentials, IdentityProvider, SecretStore, TokenCache};
use crate::clock::Clock;
use crate::observability;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

/// Cache-first bearer token acquisition for tenants
///
/// Reads go through the [`TokenCache`] read lock and never wait on an exchange. Exchanges
/// are serialized per tenant so concurrent reconciliations of one tenant trigger a single
/// exchange, while other tenants proceed independently.
pub struct TokenManager {
    identity: Arc<dyn IdentityProvider>,
    secrets: Arc<dyn SecretStore>,
    realm: String,
    cache: TokenCache,
    clock: Arc<dyn Clock>,
    exchange_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("realm", &self.realm)
            .field("cached_tenants", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        secrets: Arc<dyn SecretStore>,
        realm: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            secrets,
            realm: realm.into(),
            cache: TokenCache::new(),
            clock,
            exchange_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Cached, unexpired token for `tenant`, without any remote call
    pub fn get_active_token(&self, tenant: &str) -> Option<String> {
        let token = self.cache.valid_token(tenant, self.clock.now());
        if token.is_some() {
            observability::metrics::increment_token_cache_hits();
        }
        token
    }

    /// Token for `tenant` using the given credentials
    ///
    /// With `use_cache` a valid cached token is returned as is; otherwise a new exchange is
    /// always performed and the cache entry replaced.
    pub async fn get_access_token(
        &self,
        tenant: &str,
        credentials: &ClientCredentials,
        use_cache: bool,
    ) -> Result<String, AuthError> {
        if use_cache {
            if let Some(token) = self.get_active_token(tenant) {
                return Ok(token);
            }
        }

        let lock = self.exchange_lock(tenant);
        let _guard = lock.lock().await;
        if use_cache {
            if let Some(token) = self.get_active_token(tenant) {
                return Ok(token);
            }
        }
        self.exchange(tenant, credentials).await
    }

    /// Token for `tenant`, fetching its credentials from the secret store on a cache miss
    pub async fn authenticate(&self, tenant: &str) -> Result<String, AuthError> {
        if let Some(token) = self.get_active_token(tenant) {
            debug!(tenant = tenant, "Found active token");
            return Ok(token);
        }

        let lock = self.exchange_lock(tenant);
        let _guard = lock.lock().await;
        // Another reconciliation of the same tenant may have refreshed it while we waited
        if let Some(token) = self.get_active_token(tenant) {
            return Ok(token);
        }

        let secret = self.secrets.get_secret(tenant).await?;
        let credentials = ClientCredentials::from_secret(tenant, &secret)?;
        debug!(tenant = tenant, client_id = %credentials.client_id, "Retrieved tenant API client");
        self.exchange(tenant, &credentials).await
    }

    async fn exchange(
        &self,
        tenant: &str,
        credentials: &ClientCredentials,
    ) -> Result<String, AuthError> {
        let result = self
            .identity
            .login_client(
                &credentials.client_id,
                credentials.client_secret.as_str(),
                &self.realm,
            )
            .await;
        observability::metrics::increment_token_exchanges(if result.is_ok() {
            "success"
        } else {
            "error"
        });

        let token = result?;
        let access_token = token.access_token.clone();
        info!(
            tenant = tenant,
            expires_in = token.expires_in,
            "Obtained access token"
        );
        self.cache.insert(tenant, token, self.clock.now());
        Ok(access_token)
    }

    fn exchange_lock(&self, tenant: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .exchange_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry(tenant.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessToken, MockIdentityProvider, MockSecretStore};
    use crate::clock::testing::ManualClock;
    use chrono::Duration;
    use mockall::predicate::eq;

    fn tenant_secret() -> HashMap<String, String> {
        HashMap::from([
            ("client-id".to_string(), "client-a".to_string()),
            ("client-secret".to_string(), "secret-a".to_string()),
        ])
    }

    fn manager(
        identity: MockIdentityProvider,
        secrets: MockSecretStore,
        clock: Arc<ManualClock>,
    ) -> TokenManager {
        TokenManager::new(Arc::new(identity), Arc::new(secrets), "tenants", clock)
    }

    #[tokio::test]
    async fn test_authenticate_exchanges_once_then_uses_cache() {
        let clock = Arc::new(ManualClock::at("2025-03-01T10:00:00Z"));
        let mut secrets = MockSecretStore::new();
        secrets
            .expect_get_secret()
            .with(eq("ARU-1"))
            .times(1)
            .returning(|_| Ok(tenant_secret()));
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_login_client()
            .with(eq("client-a"), eq("secret-a"), eq("tenants"))
            .times(1)
            .returning(|_, _, _| Ok(AccessToken::new("token-1", 300)));

        let manager = manager(identity, secrets, Arc::clone(&clock));
        assert_eq!(manager.authenticate("ARU-1").await.unwrap(), "token-1");
        clock.advance(Duration::seconds(60));
        assert_eq!(manager.authenticate("ARU-1").await.unwrap(), "token-1");
        assert_eq!(manager.get_active_token("ARU-1").as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let clock = Arc::new(ManualClock::at("2025-03-01T10:00:00Z"));
        let mut secrets = MockSecretStore::new();
        secrets
            .expect_get_secret()
            .times(2)
            .returning(|_| Ok(tenant_secret()));
        let mut identity = MockIdentityProvider::new();
        let mut issued = 0;
        identity
            .expect_login_client()
            .times(2)
            .returning(move |_, _, _| {
                issued += 1;
                Ok(AccessToken::new(format!("token-{issued}"), 30))
            });

        let manager = manager(identity, secrets, Arc::clone(&clock));
        assert_eq!(manager.authenticate("ARU-1").await.unwrap(), "token-1");
        clock.advance(Duration::seconds(20));
        assert_eq!(manager.get_active_token("ARU-1"), None);
        assert_eq!(manager.authenticate("ARU-1").await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_get_access_token_without_cache_always_exchanges() {
        let clock = Arc::new(ManualClock::at("2025-03-01T10:00:00Z"));
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_login_client()
            .times(2)
            .returning(|_, _, _| Ok(AccessToken::new("fresh", 300)));

        let manager = manager(identity, MockSecretStore::new(), clock);
        let creds = ClientCredentials::new("client-a", "secret-a");
        manager.get_access_token("ARU-1", &creds, false).await.unwrap();
        manager.get_access_token("ARU-1", &creds, false).await.unwrap();
        // A cached lookup is served without another exchange
        assert_eq!(
            manager.get_access_token("ARU-1", &creds, true).await.unwrap(),
            "fresh"
        );
    }

    #[tokio::test]
    async fn test_secret_store_failure_is_reported() {
        let clock = Arc::new(ManualClock::at("2025-03-01T10:00:00Z"));
        let mut secrets = MockSecretStore::new();
        secrets
            .expect_get_secret()
            .returning(|_| Err(AuthError::SecretStore("sealed".to_string())));

        let manager = manager(MockIdentityProvider::new(), secrets, clock);
        let err = manager.authenticate("ARU-1").await.unwrap_err();
        assert!(matches!(err, AuthError::SecretStore(_)));
        assert_eq!(manager.get_active_token("ARU-1"), None);
    }

    #[tokio::test]
    async fn test_tenants_are_cached_independently() {
        let clock = Arc::new(ManualClock::at("2025-03-01T10:00:00Z"));
        let mut secrets = MockSecretStore::new();
        secrets
            .expect_get_secret()
            .times(2)
            .returning(|_| Ok(tenant_secret()));
        let mut identity = MockIdentityProvider::new();
        let mut issued = 0;
        identity
            .expect_login_client()
            .times(2)
            .returning(move |_, _, _| {
                issued += 1;
                Ok(AccessToken::new(format!("token-{issued}"), 300))
            });

        let manager = manager(identity, secrets, clock);
        let a = manager.authenticate("ARU-1").await.unwrap();
        let b = manager.authenticate("ARU-2").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(manager.get_active_token("ARU-1"), Some(a));
    }
}
