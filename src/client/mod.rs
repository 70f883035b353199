//! Request execution engine for the LearnHub API.
//!
//! The pieces, leaves first:
//!
//! - [`RequestDescriptor`] / [`Request`]: what to send and what shape to expect
//! - [`Transport`] / [`HttpTransport`]: one HTTP exchange, status classified
//! - [`decode`] / [`decode_page`]: body to typed value or [`PageEnvelope`]
//! - [`Dispatcher`]: bearer attachment, single decode or page walk
//! - [`LearnHubClient`]: the public entry point
//!
//! # Example
//!
//! ```no_run
//! use learnhub_rs::client::{Many, Request};
//! use learnhub_rs::LearnHubClient;
//!
//! #[derive(Debug, serde::Deserialize)]
//! struct User { id: String }
//!
//! # async fn example() -> learnhub_rs::Result<()> {
//! let client = LearnHubClient::from_env()?;
//! let users = client.run(&Request::<Many<User>>::get("/v1/users")).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod decoder;
mod dispatch;
mod http;
pub mod paginated;
mod request;
mod transport;

pub use config::{ClientConfig, BASE_URL_ENV, CLIENT_SECRET_ENV, DEFAULT_TOKEN_PATH};
pub use decoder::{decode, decode_page, timestamp, PageEnvelope, Paging};
pub use dispatch::Dispatcher;
pub use http::{HttpTransport, LearnHubClient};
pub use paginated::PaginatedStream;
pub use request::{
    Body, Many, One, Request, RequestDescriptor, ResultShape, Shape, Target, APPLICATION_JSON,
    FORM_URLENCODED,
};
pub use transport::Transport;
