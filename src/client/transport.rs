//! The single-exchange seam between the dispatcher and the network.

use async_trait::async_trait;

use super::request::{RequestDescriptor, Target};
use crate::Result;

/// Executes exactly one HTTP exchange for a request descriptor.
///
/// Implementations make a single attempt and never retry. On success they
/// return the raw body (possibly empty); status classification follows
/// the rules documented on [`HttpTransport`](super::HttpTransport).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run the exchange against `target` and return the response body.
    async fn execute(&self, request: &RequestDescriptor, target: Target<'_>) -> Result<String>;
}
