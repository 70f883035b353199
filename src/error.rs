//! Error types for the LearnHub API client.
//!
//! Every failure the request engine can produce surfaces through [`Error`].
//! Nothing is retried inside the crate; callers own retry policy.

use thiserror::Error;

/// A specialized `Result` type for LearnHub operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all LearnHub API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The server answered 404 for the requested path.
    #[error("Not found: {path}: {body}")]
    NotFound {
        /// Path (or next-page link) that was requested
        path: String,
        /// Raw response body
        body: String,
    },

    /// The server answered with a status other than 200, 201, 204 or 404.
    #[error("Unexpected response: status={status}, body={body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Connection, timeout or other I/O failure below HTTP.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body did not match the expected shape.
    #[error("Malformed response for {target}: {source}")]
    MalformedResponse {
        /// Name of the type the body was decoded into
        target: &'static str,
        /// Offending body
        body: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// The request descriptor could not be turned into a URL or request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The blocking facade could not start a runtime.
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for a 404 answer.
    ///
    /// # Example
    ///
    /// ```
    /// use learnhub_rs::Error;
    ///
    /// let err = Error::NotFound {
    ///     path: "/v1/courses/7".into(),
    ///     body: r#"{"message":"no such course"}"#.into(),
    /// };
    /// assert!(err.is_not_found());
    /// ```
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound { .. } => Some(404),
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body carried by the error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::NotFound { body, .. }
            | Error::UnexpectedStatus { body, .. }
            | Error::MalformedResponse { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns `true` if this error is potentially transient.
    ///
    /// Informational only: the client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout() || e.is_connect(),
            Error::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this error indicates a client-side issue.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::UnexpectedStatus { status, .. } => (400..500).contains(status),
            Error::InvalidRequest(_) | Error::Config(_) | Error::UrlParse(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this error indicates a server-side issue.
    pub fn is_server_error(&self) -> bool {
        match self {
            Error::UnexpectedStatus { status, .. } => *status >= 500,
            Error::MalformedResponse { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn malformed<T: ?Sized>(body: &str, source: serde_json::Error) -> Self {
        Error::MalformedResponse {
            target: std::any::type_name::<T>(),
            body: body.to_string(),
            source,
        }
    }
}
