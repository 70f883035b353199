//! Client configuration options.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "LEARNHUB_BASE_URL";

/// Environment variable holding the client secret.
pub const CLIENT_SECRET_ENV: &str = "LEARNHUB_CLIENT_SECRET";

/// Default path of the token endpoint.
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/token";

/// Configuration for the LearnHub client.
///
/// The defaults favour slow write-heavy endpoints: a short connect timeout
/// and long read and overall bounds.
///
/// # Example
///
/// ```
/// use learnhub_rs::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("https://api.learnhub.example", "secret")
///     .with_connect_timeout(Duration::from_secs(5))
///     .with_user_agent("my-app/1.0");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to
    pub base_url: String,
    /// Secret sent, base64-encoded, to the token endpoint
    pub client_secret: SecretString,
    /// Path of the token endpoint
    pub token_path: String,
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
    /// Timeout for reading a response
    pub read_timeout: Duration,
    /// Timeout for sending a request body
    pub write_timeout: Duration,
    /// Upper bound for a whole exchange
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with default timeouts.
    pub fn new(base_url: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_secret: SecretString::from(client_secret.into()),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(300),
            write_timeout: Duration::from_secs(300),
            timeout: Duration::from_secs(600),
            user_agent: format!("learnhub-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Build a configuration from `LEARNHUB_BASE_URL` and `LEARNHUB_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .map_err(|_| Error::Config(format!("{BASE_URL_ENV} not set")))?;
        let secret = std::env::var(CLIENT_SECRET_ENV)
            .map_err(|_| Error::Config(format!("{CLIENT_SECRET_ENV} not set")))?;
        let config = Self::new(base_url, secret);
        config.validate()?;
        Ok(config)
    }

    /// Set the token endpoint path.
    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    ///
    /// reqwest has no separate write phase, so this only takes effect
    /// through the overall timeout, which is raised to at least this value.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the overall per-exchange timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check that the base URL is usable.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base URL must be http or https: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    pub(crate) fn effective_timeout(&self) -> Duration {
        self.timeout.max(self.write_timeout)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("client_secret", &"[REDACTED]")
            .field("token_path", &self.token_path)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
