//! Paginated stream for lazy iteration over list results.
//!
//! [`PaginatedStream`] follows the same next-page chain as
//! [`LearnHubClient::run`](super::LearnHubClient::run) on a `Many` request,
//! but yields items as each page arrives instead of collecting them.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use futures_util::Stream;
use serde::de::DeserializeOwned;

use super::decoder::PageEnvelope;
use super::dispatch::Dispatcher;
use super::request::{RequestDescriptor, Target};
use crate::Result;

/// Where the next page comes from.
enum Cursor {
    First,
    Link(String),
}

type FetchPage<T> = Box<dyn Fn(Cursor) -> BoxFuture<'static, Result<PageEnvelope<T>>> + Send + Sync>;

/// A stream that lazily fetches pages from a list endpoint.
///
/// Each page fetch re-checks the credential, so a long walk survives token
/// expiry. The first error is yielded once and ends the stream.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
/// use learnhub_rs::client::{Many, Request};
///
/// #[derive(Debug, serde::Deserialize)]
/// struct User { id: String }
///
/// # async fn example(client: learnhub_rs::LearnHubClient) -> learnhub_rs::Result<()> {
/// let mut users = client.stream(&Request::<Many<User>>::get("/v1/users"));
/// while let Some(user) = users.next().await {
///     println!("{:?}", user?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PaginatedStream<T> {
    /// Function to fetch a page.
    fetch_page: FetchPage<T>,
    /// Items of the current page not yet yielded.
    current_items: VecDeque<T>,
    /// Next page to fetch, `None` once exhausted.
    next: Option<Cursor>,
    /// Current in-flight fetch.
    pending_fetch: Option<BoxFuture<'static, Result<PageEnvelope<T>>>>,
    /// Pages fetched so far.
    pages: usize,
}

impl<T> PaginatedStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(dispatcher: Arc<Dispatcher>, descriptor: RequestDescriptor) -> Self {
        let descriptor = Arc::new(descriptor);
        let fetch_page: FetchPage<T> =
            Box::new(move |cursor: Cursor| -> BoxFuture<'static, Result<PageEnvelope<T>>> {
                let dispatcher = dispatcher.clone();
                let descriptor = descriptor.clone();
                Box::pin(async move {
                    let authorized = dispatcher.authorize(&descriptor).await?;
                    let target = match &cursor {
                        Cursor::First => Target::Template,
                        Cursor::Link(link) => Target::Link(link),
                    };
                    dispatcher.fetch_page::<T>(&authorized, target).await
                })
            });

        Self {
            fetch_page,
            current_items: VecDeque::new(),
            next: Some(Cursor::First),
            pending_fetch: None,
            pages: 0,
        }
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }
}

impl<T> Stream for PaginatedStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(item) = this.current_items.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            if let Some(fut) = this.pending_fetch.as_mut() {
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.pending_fetch = None;
                        this.pages += 1;
                        this.next = page.next_link().map(|link| Cursor::Link(link.to_owned()));
                        this.current_items = page.results.into();
                        // An empty page may still point at more pages.
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.pending_fetch = None;
                        this.next = None;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            match this.next.take() {
                Some(cursor) => {
                    this.pending_fetch = Some((this.fetch_page)(cursor));
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

impl<T> Unpin for PaginatedStream<T> {}
