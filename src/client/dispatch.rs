//! Authorization, dispatch and pagination.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::decoder::{decode, decode_page, PageEnvelope};
use super::request::{Request, RequestDescriptor, Shape, Target};
use super::transport::Transport;
use crate::auth::{Credential, CredentialStore, TokenRenewal};
use crate::Result;

/// Turns typed requests into typed results.
///
/// Every call makes sure the credential is fresh, attaches it as a bearer
/// header, then either decodes one body or walks the page chain. Any
/// failure ends the call; pages already fetched are dropped.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    renewal: TokenRenewal,
}

impl Dispatcher {
    /// Create a dispatcher over `transport`.
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
        renewal: TokenRenewal,
    ) -> Self {
        Self {
            transport,
            credentials,
            renewal,
        }
    }

    /// The credential cache.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Run `request` to completion.
    pub async fn run<S: Shape>(&self, request: &Request<S>) -> Result<S::Output> {
        let descriptor = self.authorize(request.descriptor()).await?;
        debug!(
            method = %descriptor.method(),
            path = descriptor.path(),
            shape = ?descriptor.shape(),
            "dispatching request"
        );
        S::dispatch(self, &descriptor).await
    }

    /// Force a token exchange regardless of expiry.
    pub async fn renew(&self) -> Result<Credential> {
        self.renewal
            .renew(self.transport.as_ref(), &self.credentials)
            .await
    }

    /// Copy `descriptor` with a fresh bearer header, renewing first if the
    /// cached credential has expired.
    pub(crate) async fn authorize(&self, descriptor: &RequestDescriptor) -> Result<RequestDescriptor> {
        if self.credentials.is_expired().await {
            self.renew().await?;
        }
        let token = self.credentials.current().await;

        let mut authorized = descriptor.clone();
        authorized.set_authorization("Bearer", &token)?;
        Ok(authorized)
    }

    pub(crate) async fn fetch_one<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<T> {
        let body = self.transport.execute(descriptor, Target::Template).await?;
        decode(&body)
    }

    pub(crate) async fn fetch_page<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
        target: Target<'_>,
    ) -> Result<PageEnvelope<T>> {
        let body = self.transport.execute(descriptor, target).await?;
        decode_page(&body)
    }

    pub(crate) async fn fetch_all<T: DeserializeOwned + Send>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<Vec<T>> {
        let first = self.fetch_page::<T>(descriptor, Target::Template).await?;
        let mut next = first.next_link().map(str::to_owned);
        let mut items = first.results;
        let mut pages = 1usize;

        while let Some(link) = next {
            debug!(page = pages + 1, link = %link, "following next page");
            let page = self.fetch_page::<T>(descriptor, Target::Link(&link)).await?;
            next = page.next_link().map(str::to_owned);
            items.extend(page.results);
            pages += 1;
        }

        debug!(pages, items = items.len(), "pagination complete");
        Ok(items)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("credentials", &self.credentials)
            .field("renewal", &self.renewal)
            .finish()
    }
}
