//! HTTP client implementation for the LearnHub API.

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tokio::runtime::RuntimeFlavor;
use tracing::{debug, warn};
use url::Url;

use super::config::ClientConfig;
use super::dispatch::Dispatcher;
use super::paginated::PaginatedStream;
use super::request::{Many, Request, RequestDescriptor, Shape, Target};
use super::transport::Transport;
use crate::auth::{CredentialStore, TokenRenewal};
use crate::{Error, Result};

/// The main client for interacting with the LearnHub API.
///
/// Cloning is cheap; clones share the connection pool and the cached
/// credential.
///
/// # Example
///
/// ```no_run
/// use learnhub_rs::client::{Many, One, Request};
/// use learnhub_rs::{ClientConfig, LearnHubClient};
///
/// #[derive(Debug, serde::Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Course { id: String, title: String }
///
/// # async fn example() -> learnhub_rs::Result<()> {
/// let client = LearnHubClient::new(ClientConfig::new(
///     "https://api.learnhub.example",
///     "client-secret",
/// ))?;
///
/// // One course
/// let course = client
///     .run(&Request::<One<Course>>::get("/v1/courses/{courseId}").path_param("courseId", "c-1"))
///     .await?;
///
/// // Every course, all pages
/// let courses = client.run(&Request::<Many<Course>>::get("/v1/courses")).await?;
/// println!("{} has {} siblings", course.title, courses.len() - 1);
/// # Ok(())
/// # }
/// ```
pub struct LearnHubClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) config: ClientConfig,
    blocking_runtime: OnceLock<tokio::runtime::Runtime>,
}

impl LearnHubClient {
    /// Create a client that talks HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client from `LEARNHUB_BASE_URL` and `LEARNHUB_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let renewal = TokenRenewal::new(config.client_secret.clone(), config.token_path.clone());
        let dispatcher = Dispatcher::new(transport, CredentialStore::new(), renewal);

        Self {
            inner: Arc::new(ClientInner {
                dispatcher: Arc::new(dispatcher),
                config,
                blocking_runtime: OnceLock::new(),
            }),
        }
    }

    /// Run `request` and return its typed result.
    ///
    /// A `One<T>` request performs one exchange. A `Many<T>` request
    /// follows `paging.nextPage` until it is absent and returns every
    /// page's items in order.
    pub async fn run<S: Shape>(&self, request: &Request<S>) -> Result<S::Output> {
        self.inner.dispatcher.run(request).await
    }

    /// Blocking version of [`run`](Self::run).
    ///
    /// Outside a Tokio runtime this drives the call on a runtime owned by
    /// the client. Inside a multi-threaded runtime it blocks the current
    /// worker in place. A current-thread runtime cannot be blocked, so the
    /// call fails there with [`Error::Runtime`] without sending anything.
    pub fn run_blocking<S: Shape>(&self, request: &Request<S>) -> Result<S::Output> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => {
                Err(Error::Runtime(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "run_blocking cannot block a current-thread runtime; use run instead",
                )))
            }
            Ok(handle) => tokio::task::block_in_place(|| handle.block_on(self.run(request))),
            Err(_) => self.inner.blocking_runtime()?.block_on(self.run(request)),
        }
    }

    /// Stream the items of a list request page by page.
    pub fn stream<T>(&self, request: &Request<Many<T>>) -> PaginatedStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        PaginatedStream::new(self.inner.dispatcher.clone(), request.descriptor().clone())
    }

    /// Renew the access token now, regardless of expiry.
    pub async fn refresh_credentials(&self) -> Result<()> {
        self.inner.dispatcher.renew().await.map(|_| ())
    }

    /// The credential cache.
    pub fn credentials(&self) -> &CredentialStore {
        self.inner.dispatcher.credentials()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

impl ClientInner {
    fn blocking_runtime(&self) -> Result<&tokio::runtime::Runtime> {
        if let Some(runtime) = self.blocking_runtime.get() {
            return Ok(runtime);
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("learnhub-blocking")
            .enable_all()
            .build()?;
        // A racing thread may have won; its runtime is kept and ours dropped.
        let _ = self.blocking_runtime.set(runtime);
        self.blocking_runtime
            .get()
            .ok_or_else(|| Error::Config("blocking runtime unavailable".to_string()))
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // The last clone may be dropped inside an async context.
        if let Some(runtime) = self.blocking_runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Clone for LearnHubClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl fmt::Debug for LearnHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearnHubClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

/// [`Transport`] over a pooled `reqwest` client.
///
/// Status handling:
/// - 200, 201, 204: the body is returned as text (empty for 204); invalid
///   UTF-8 sequences are replaced with U+FFFD
/// - 404: [`Error::NotFound`] with the requested path and body
/// - anything else: [`Error::UnexpectedStatus`] with status and body
/// - connection, timeout and I/O failures: [`Error::Transport`]
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport with the timeouts and user agent from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.effective_timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the URL for `target`, returning it with the path used in
    /// not-found errors.
    pub(crate) fn url_for(
        &self,
        request: &RequestDescriptor,
        target: Target<'_>,
    ) -> Result<(Url, String)> {
        match target {
            Target::Template => {
                let path = request.resolve_path()?;
                let mut url = Url::parse(&self.join(&path))?;
                if !request.query().is_empty() {
                    url.query_pairs_mut().extend_pairs(request.query());
                }
                Ok((url, path))
            }
            Target::Link(link) if link.starts_with("http://") || link.starts_with("https://") => {
                Ok((Url::parse(link)?, link.to_string()))
            }
            Target::Link(link) => Ok((Url::parse(&self.join(link))?, link.to_string())),
        }
    }

    fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &RequestDescriptor, target: Target<'_>) -> Result<String> {
        let (url, path) = self.url_for(request, target)?;
        let method = request.method().clone();

        let mut headers = request.headers().clone();
        let mut builder = self.http.request(method.clone(), url.clone());
        if let Some(body) = request.body() {
            let content_type = HeaderValue::from_str(&body.content_type)
                .map_err(|_| Error::InvalidRequest(format!("Invalid content type {}", body.content_type)))?;
            headers.insert(CONTENT_TYPE, content_type);
            builder = builder.body(body.content.clone());
        }
        let builder = builder.headers(headers);

        debug!(%method, %url, "sending request");
        let response = builder.send().await?;
        let status = response.status();
        // Invalid UTF-8 is replaced with U+FFFD; decoding then reports the body.
        let body = String::from_utf8_lossy(&response.bytes().await?).into_owned();
        debug!(%method, %url, %status, bytes = body.len(), "received response");

        match status.as_u16() {
            200 | 201 | 204 => Ok(body),
            404 => {
                warn!(%method, %url, "resource not found");
                Err(Error::NotFound { path, body })
            }
            code => {
                warn!(%method, %url, status = code, "unexpected response status");
                Err(Error::UnexpectedStatus { status: code, body })
            }
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}
