//! Client-credentials token renewal.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use super::credential::{Credential, CredentialStore};
use crate::client::{decode, One, Request, Target, Transport};
use crate::Result;

/// Grant type sent to the token endpoint.
pub const GRANT_TYPE: &str = "client_credentials";

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The bearer token
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Token type, usually `bearer`
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Expiry instant when the response was received at `now`.
    ///
    /// Zero or negative lifetimes are taken as-is; an out-of-range lifetime
    /// saturates at the representable bounds.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(if self.expires_in < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }
}

/// Obtains a fresh bearer token from the token endpoint.
///
/// The exchange is an ordinary request run through the same
/// [`Transport`] and decoder as every API call, so its failures surface
/// with the same error variants.
pub struct TokenRenewal {
    client_secret: SecretString,
    token_path: String,
}

impl TokenRenewal {
    /// Create a renewal flow for `client_secret` against `token_path`.
    pub fn new(client_secret: SecretString, token_path: impl Into<String>) -> Self {
        Self {
            client_secret,
            token_path: token_path.into(),
        }
    }

    /// The fixed token request: form-encoded client-credentials grant with
    /// Basic authorization.
    pub fn token_request(&self) -> Result<Request<One<TokenResponse>>> {
        let encoded = BASE64.encode(self.client_secret.expose_secret());
        Request::<One<TokenResponse>>::post(self.token_path.as_str())
            .form([("grant_type", GRANT_TYPE)])
            .authorization("Basic", &encoded)
    }

    /// Run the token exchange and store the result.
    ///
    /// Nothing is retried; any failure propagates unchanged.
    pub async fn renew(
        &self,
        transport: &dyn Transport,
        store: &CredentialStore,
    ) -> Result<Credential> {
        debug!(path = %self.token_path, "requesting access token");

        let request = self.token_request()?.into_descriptor();
        let body = transport.execute(&request, Target::Template).await?;
        let response: TokenResponse = decode(&body)?;

        let expires_at = response.expires_at(Utc::now());
        store.update(response.access_token.clone(), expires_at).await;

        info!(%expires_at, expires_in = response.expires_in, "access token renewed");
        Ok(Credential::new(response.access_token, expires_at))
    }
}

impl fmt::Debug for TokenRenewal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRenewal")
            .field("client_secret", &"[REDACTED]")
            .field("token_path", &self.token_path)
            .finish()
    }
}
