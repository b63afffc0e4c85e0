use super::AuthError;
use crate::constants::{SECRET_KEY_CLIENT_ID, SECRET_KEY_CLIENT_SECRET};
use std::collections::HashMap;
use zeroize::Zeroizing;

/// Tenant API client used for the client-credentials exchange
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Zeroizing<String>,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Zeroizing::new(client_secret.into()),
        }
    }

    /// Read `client-id` and `client-secret` from a tenant secret
    pub fn from_secret(tenant: &str, data: &HashMap<String, String>) -> Result<Self, AuthError> {
        let field = |key: &'static str| {
            data.get(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AuthError::MissingCredential {
                    tenant: tenant.to_string(),
                    key,
                })
        };
        let client_id = field(SECRET_KEY_CLIENT_ID)?;
        let client_secret = field(SECRET_KEY_CLIENT_SECRET)?;
        Ok(Self::new(client_id.clone(), client_secret.clone()))
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_secret_reads_both_keys() {
        let data = HashMap::from([
            ("client-id".to_string(), "tenant-client".to_string()),
            ("client-secret".to_string(), "hunter2".to_string()),
        ]);
        let creds = ClientCredentials::from_secret("ARU-1", &data).unwrap();
        assert_eq!(creds.client_id, "tenant-client");
        assert_eq!(creds.client_secret.as_str(), "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_from_secret_reports_missing_secret() {
        let data = HashMap::from([("client-id".to_string(), "tenant-client".to_string())]);
        let err = ClientCredentials::from_secret("ARU-1", &data).unwrap_err();
        assert!(matches!(
            err,
            AuthError::MissingCredential { key: "client-secret", .. }
        ));
    }
}
