//! # learnhub-rs
//!
//! A typed Rust client for the LearnHub educational platform REST API.
//!
//! The crate is the request-execution engine behind every API operation:
//! it caches a bearer token and renews it through a client-credentials
//! grant, turns a declarative request description into an HTTP exchange,
//! follows `paging.nextPage` links across list endpoints, and decodes the
//! result into your own serde types.
//!
//! ## Features
//!
//! - **Credential caching**: tokens renew automatically when they expire
//! - **One entry point**: [`LearnHubClient::run`] for single values and whole lists
//! - **Pagination**: `Many<T>` requests return every page's items, in order
//! - **Streaming**: [`LearnHubClient::stream`] yields list items lazily
//! - **Blocking facade**: [`LearnHubClient::run_blocking`] for sync callers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::{DateTime, Utc};
//! use learnhub_rs::prelude::*;
//!
//! #[derive(Debug, serde::Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Course {
//!     id: String,
//!     title: String,
//!     #[serde(with = "learnhub_rs::client::timestamp")]
//!     created_at: DateTime<Utc>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> learnhub_rs::Result<()> {
//!     let client = LearnHubClient::new(ClientConfig::new(
//!         "https://api.learnhub.example",
//!         std::env::var("LEARNHUB_CLIENT_SECRET").unwrap_or_default(),
//!     ))?;
//!
//!     let course = client
//!         .run(&Request::<One<Course>>::get("/v1/courses/{courseId}").path_param("courseId", "c-1"))
//!         .await?;
//!     println!("{} (created {})", course.title, course.created_at);
//!
//!     let all = client.run(&Request::<Many<Course>>::get("/v1/courses")).await?;
//!     println!("{} courses", all.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Nothing is retried. A 404 surfaces as [`Error::NotFound`], other
//! statuses as [`Error::UnexpectedStatus`], network failures as
//! [`Error::Transport`] and undecodable bodies as
//! [`Error::MalformedResponse`]. A failure on any page fails the whole call.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod client;
pub mod error;

// Re-export primary types at crate root for convenience
pub use auth::{Credential, CredentialStore};
pub use client::{ClientConfig, LearnHubClient, Many, One, Request};
pub use error::{Error, Result};

/// Prelude module for convenient imports.
///
/// ```rust
/// use learnhub_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::auth::{Credential, CredentialStore};
    pub use crate::client::{
        ClientConfig, LearnHubClient, Many, One, PageEnvelope, PaginatedStream, Paging, Request,
        RequestDescriptor, ResultShape,
    };
    pub use crate::error::{Error, Result};
}
