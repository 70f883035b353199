//! Credential handling for the LearnHub API.
//!
//! The API authenticates with short-lived bearer tokens obtained through a
//! client-credentials grant. [`CredentialStore`] caches the current token
//! and its expiry; [`TokenRenewal`] performs the grant whenever the
//! dispatcher finds the cached token expired.
//!
//! ```
//! use learnhub_rs::auth::CredentialStore;
//!
//! # async fn example() {
//! // A new store is always expired, so the first call renews.
//! let store = CredentialStore::new();
//! assert!(store.is_expired().await);
//! # }
//! ```

mod credential;
mod renewal;

pub use credential::{Credential, CredentialStore};
pub use renewal::{TokenRenewal, TokenResponse, GRANT_TYPE};
