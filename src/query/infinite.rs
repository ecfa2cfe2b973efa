//! # Paginated Query Handle
//!
//! [`InfiniteQuery`] turns a single-page fetch function into an
//! incrementally loaded, cached and de-duplicated sequence of pages.
//!
//! ```text
//!   subscribe ──► fetch(None) ──► [page 1]
//!   fetch_next_page ──► fetch(page1.next) ──► [page 1, page 2]
//!   fetch_next_page ──► (last page has no token) ──► no-op
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;

use super::cache::Subscription;
use super::entry::{InfiniteEntry, QueryStatus};
use super::{Page, QueryItem, QueryKey};
use crate::error::{QueryError, Result};

/// A single-page fetch function: `cursor -> Page<T>`.
pub type PageFetcher<T> =
    Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync>;

/// Wrap an async closure as a [`PageFetcher`].
pub fn page_fetcher<T, F, Fut>(fetch: F) -> PageFetcher<T>
where
    F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>>> + Send + 'static,
{
    Arc::new(move |cursor| fetch(cursor).boxed())
}

/// Point-in-time view of a paginated query.
#[derive(Debug, Clone)]
pub struct InfiniteSnapshot<T> {
    /// Pages in fetch order
    pub pages: Vec<Arc<Page<T>>>,
    /// State classification
    pub status: QueryStatus,
    /// Last error, kept until a fetch succeeds
    pub error: Option<QueryError>,
    /// Any fetch in flight
    pub is_fetching: bool,
    /// A next-page fetch in flight
    pub is_fetching_next_page: bool,
    /// The last page carries a continuation token
    pub has_next_page: bool,
}

impl<T> InfiniteSnapshot<T> {
    /// The first page is in flight.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Nothing loaded or requested.
    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    /// All items, page by page.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    /// Number of items across all pages.
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }

    /// At least one page with at least one item.
    pub fn has_items(&self) -> bool {
        self.pages.iter().any(|page| !page.items.is_empty())
    }
}

impl<T: Clone> InfiniteSnapshot<T> {
    /// Owned copy of all items.
    pub fn to_items(&self) -> Vec<T> {
        self.items().cloned().collect()
    }
}

/// A consumer's handle on a paginated query.
///
/// Dropping the handle unsubscribes. A fetch it started keeps running and
/// still fills the cache for other subscribers.
pub struct InfiniteQuery<T: QueryItem> {
    key: QueryKey,
    entry: Arc<InfiniteEntry<T>>,
    fetcher: PageFetcher<T>,
    enabled: bool,
    changes: watch::Receiver<u64>,
    _subscription: Subscription,
}

impl<T: QueryItem> InfiniteQuery<T> {
    pub(crate) fn new(
        key: QueryKey,
        entry: Arc<InfiniteEntry<T>>,
        fetcher: PageFetcher<T>,
        enabled: bool,
        subscription: Subscription,
    ) -> Self {
        let changes = entry.watch();
        Self {
            key,
            entry,
            fetcher,
            enabled,
            changes,
            _subscription: subscription,
        }
    }

    /// Cache key of this query
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Whether this handle may fetch
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current state.
    pub fn snapshot(&self) -> InfiniteSnapshot<T> {
        self.entry.snapshot()
    }

    /// Request the page after the last one.
    ///
    /// Returns `false` without fetching when the query is disabled, the last
    /// page is terminal, or a fetch for this key is in flight.
    pub fn fetch_next_page(&self) -> bool {
        self.enabled && self.entry.fetch_next(&self.fetcher)
    }

    /// Re-run the fetch that failed, with the cursor it failed on.
    ///
    /// Returns `false` if the last fetch did not fail or one is in flight.
    pub fn retry(&self) -> bool {
        self.enabled && self.entry.retry(&self.fetcher)
    }

    /// Wait for the next state change.
    pub async fn changed(&mut self) {
        // The sender lives in the entry this handle holds, so it cannot close.
        let _ = self.changes.changed().await;
    }

    /// Wait until no fetch is in flight and return the state.
    pub async fn settled(&mut self) -> InfiniteSnapshot<T> {
        loop {
            self.changes.borrow_and_update();
            let snapshot = self.entry.snapshot();
            if !snapshot.is_fetching {
                return snapshot;
            }
            if self.changes.changed().await.is_err() {
                return self.entry.snapshot();
            }
        }
    }
}
