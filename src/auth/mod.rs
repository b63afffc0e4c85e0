//! # Authentication
//!
//! Per-tenant bearer tokens for the Aruba Cloud API.
//!
//! Tenant API clients live in Vault (one KV secret per tenant holding `client-id` and
//! `client-secret`). The [`TokenManager`] exchanges them with Keycloak using the
//! client-credentials grant and caches the resulting token per tenant until it is within
//! ten seconds of expiry.
//!
//! - `token`: cached tokens and expiry
//! - `credentials`: tenant client credentials read from the secret store
//! - `keycloak`: identity provider client
//! - `vault`: secret store client (AppRole login + KV v2)
//! - `manager`: cache-first token acquisition

mod credentials;
mod keycloak;
mod manager;
mod token;
mod vault;

pub use credentials::ClientCredentials;
pub use keycloak::{IdentityProvider, KeycloakClient};
pub use manager::TokenManager;
pub use token::{AccessToken, CachedToken, TokenCache};
pub use vault::{SecretStore, VaultClient, VaultSettings};

#[cfg(test)]
pub use keycloak::MockIdentityProvider;
#[cfg(test)]
pub use vault::MockSecretStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Token exchange rejected or failed
    #[error("identity provider error: {0}")]
    IdentityProvider(String),

    /// Tenant credentials could not be read
    #[error("secret store error: {0}")]
    SecretStore(String),

    /// Tenant names a secret path, so it must be a single plain segment
    #[error("invalid tenant name {0:?}")]
    InvalidTenant(String),

    #[error("secret for tenant {tenant} has no {key}")]
    MissingCredential { tenant: String, key: &'static str },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
