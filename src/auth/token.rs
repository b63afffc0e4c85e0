use crate::constants::TOKEN_EXPIRY_SAFETY_MARGIN_SECS;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bearer token returned by the identity provider
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken {
    pub access_token: String,
    /// Lifetime in seconds from the moment it was issued
    pub expires_in: i64,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"***")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Token plus the time it was retrieved
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: AccessToken,
    pub retrieved: DateTime<Utc>,
}

impl CachedToken {
    /// A token in the last ten seconds of its life already counts as expired so it cannot
    /// lapse while a request is in flight.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let expires_at = self.retrieved + Duration::seconds(self.token.expires_in)
            - Duration::seconds(TOKEN_EXPIRY_SAFETY_MARGIN_SECS);
        now >= expires_at
    }
}

/// Tokens by tenant
///
/// Entries are replaced on refresh and never evicted; there is one per tenant seen.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<String, CachedToken>>,
}

impl TokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access token for `tenant` if one is cached and not expired at `now`
    pub fn valid_token(&self, tenant: &str, now: DateTime<Utc>) -> Option<String> {
        let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        tokens
            .get(tenant)
            .filter(|cached| !cached.is_expired(now))
            .map(|cached| cached.token.access_token.clone())
    }

    pub fn insert(&self, tenant: &str, token: AccessToken, retrieved: DateTime<Utc>) {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.insert(tenant.to_string(), CachedToken { token, retrieved });
    }

    pub fn len(&self) -> usize {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_token_expires_ten_seconds_early() {
        let retrieved = at("2025-03-01T10:00:00Z");
        let cached = CachedToken {
            token: AccessToken::new("abc", 30),
            retrieved,
        };
        assert!(!cached.is_expired(retrieved + Duration::milliseconds(19_999)));
        assert!(cached.is_expired(retrieved + Duration::seconds(20)));
        assert!(cached.is_expired(retrieved + Duration::seconds(31)));
    }

    #[test]
    fn test_cache_returns_only_valid_tokens() {
        let cache = TokenCache::new();
        let now = at("2025-03-01T10:00:00Z");
        assert_eq!(cache.valid_token("tenant-a", now), None);

        cache.insert("tenant-a", AccessToken::new("token-a", 300), now);
        assert_eq!(
            cache.valid_token("tenant-a", now + Duration::seconds(60)),
            Some("token-a".to_string())
        );
        assert_eq!(cache.valid_token("tenant-a", now + Duration::seconds(290)), None);
        assert_eq!(cache.valid_token("tenant-b", now), None);
    }

    #[test]
    fn test_refresh_replaces_entry() {
        let cache = TokenCache::new();
        let now = at("2025-03-01T10:00:00Z");
        cache.insert("tenant-a", AccessToken::new("old", 30), now);
        cache.insert("tenant-a", AccessToken::new("new", 300), now);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.valid_token("tenant-a", now), Some("new".to_string()));
    }

    #[test]
    fn test_debug_hides_token() {
        let rendered = format!("{:?}", AccessToken::new("super-secret-bearer", 30));
        assert!(!rendered.contains("super-secret-bearer"));
    }
}
