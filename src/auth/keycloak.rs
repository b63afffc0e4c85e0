use super::{AccessToken, AuthError};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

/// Client-credentials exchange against an identity provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login_client(
        &self,
        client_id: &str,
        client_secret: &str,
        realm: &str,
    ) -> Result<AccessToken, AuthError>;
}

/// Keycloak OpenID Connect token endpoint client
#[derive(Debug, Clone)]
pub struct KeycloakClient {
    http: reqwest::Client,
    base_url: String,
}

impl KeycloakClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn token_url(&self, realm: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url, realm
        )
    }
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    async fn login_client(
        &self,
        client_id: &str,
        client_secret: &str,
        realm: &str,
    ) -> Result<AccessToken, AuthError> {
        debug!(client_id = client_id, realm = realm, "keycloak.login_client");

        let response = self
            .http
            .post(self.token_url(realm))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::IdentityProvider(format!(
                "token exchange for client {client_id} failed with {status}: {}",
                body.trim()
            )));
        }

        response.json::<AccessToken>().await.map_err(AuthError::from)
    }
}
