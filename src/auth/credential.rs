//! Bearer credential cache.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

/// A bearer token and the instant it stops being valid.
pub struct Credential {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential.
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires_at,
        }
    }

    /// The placeholder every store starts with: empty token, expired at the epoch.
    pub fn expired() -> Self {
        Self::new(String::new(), DateTime::<Utc>::default())
    }

    /// The raw token.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Expiry instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Expired at or after the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self::new(self.token(), self.expires_at)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Shared holder of the current [`Credential`].
///
/// Token and expiry live behind one lock, so a reader never sees a token
/// paired with another token's expiry. Renewal itself is not serialized:
/// two callers that both observe expiry may both renew.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use learnhub_rs::auth::CredentialStore;
///
/// # async fn example() {
/// let store = CredentialStore::new();
/// assert!(store.is_expired().await);
///
/// store.update("T1", Utc::now() + Duration::hours(1)).await;
/// assert!(!store.is_expired().await);
/// assert_eq!(store.current().await, "T1");
/// # }
/// ```
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Credential>>,
}

impl Default for Credential {
    fn default() -> Self {
        Self::expired()
    }
}

impl CredentialStore {
    /// Create a store in the expired state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check expiry against the current time.
    pub async fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now()).await
    }

    /// Check expiry against `now`.
    pub async fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.inner.read().await.is_expired_at(now)
    }

    /// The current token. Does not check expiry.
    pub async fn current(&self) -> String {
        self.inner.read().await.token().to_string()
    }

    /// The current expiry instant.
    pub async fn expires_at(&self) -> DateTime<Utc> {
        self.inner.read().await.expires_at
    }

    /// A consistent copy of token and expiry.
    pub async fn snapshot(&self) -> Credential {
        self.inner.read().await.clone()
    }

    /// Replace token and expiry together.
    pub async fn update(&self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        let credential = Credential::new(token, expires_at);
        *self.inner.write().await = credential;
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("credential", &"[REDACTED]")
            .finish()
    }
}
