//! Single-entity queries.
//!
//! A [`Query`] is a paginated query whose only page holds one item and no
//! continuation token, so it shares the cache, de-duplication, retry and
//! invalidation of [`InfiniteQuery`].

use std::future::Future;

use super::entry::QueryStatus;
use super::infinite::{page_fetcher, InfiniteQuery};
use super::{Page, QueryCache, QueryItem, QueryKey};
use crate::error::{QueryError, Result};

/// Point-in-time view of a single-entity query.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    /// The entity, once loaded
    pub data: Option<T>,
    /// State classification
    pub status: QueryStatus,
    /// Last error
    pub error: Option<QueryError>,
    /// A fetch is in flight
    pub is_fetching: bool,
}

impl<T> QuerySnapshot<T> {
    /// The entity is in flight and nothing is loaded yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Nothing loaded or requested.
    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }
}

/// A consumer's handle on a single-entity query.
pub struct Query<T: QueryItem> {
    inner: InfiniteQuery<T>,
}

impl<T: QueryItem> Query<T> {
    /// Cache key of this query
    pub fn key(&self) -> &QueryKey {
        self.inner.key()
    }

    /// Whether this handle may fetch
    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    /// Current state.
    pub fn snapshot(&self) -> QuerySnapshot<T> {
        Self::project(self.inner.snapshot())
    }

    /// Re-run a failed fetch.
    pub fn retry(&self) -> bool {
        self.inner.retry()
    }

    /// Wait for the next state change.
    pub async fn changed(&mut self) {
        self.inner.changed().await
    }

    /// Wait until no fetch is in flight and return the state.
    pub async fn settled(&mut self) -> QuerySnapshot<T> {
        Self::project(self.inner.settled().await)
    }

    fn project(snapshot: super::InfiniteSnapshot<T>) -> QuerySnapshot<T> {
        let data = snapshot.items().next().cloned();
        QuerySnapshot {
            data,
            status: snapshot.status,
            error: snapshot.error,
            is_fetching: snapshot.is_fetching,
        }
    }
}

impl QueryCache {
    /// Subscribe to a single-entity query.
    pub fn query<T, F, Fut>(&self, key: QueryKey, enabled: bool, fetch: F) -> Result<Query<T>>
    where
        T: QueryItem,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let fetcher = page_fetcher(move |_cursor| {
            let item = fetch();
            async move { item.await.map(|item| Page::last(vec![item])) }
        });
        Ok(Query {
            inner: self.infinite(key, fetcher, enabled)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::config::QueryConfig;
    use crate::error::Error;

    #[tokio::test]
    async fn test_single_query_loads_once() {
        let cache = QueryCache::new(QueryConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok("hiking-club".to_string()) }
            }
        };

        let mut query = cache.query(QueryKey::community(7), true, fetch.clone()).unwrap();
        assert!(query.snapshot().is_loading());
        let snapshot = query.settled().await;
        assert_eq!(snapshot.data.as_deref(), Some("hiking-club"));
        assert_eq!(snapshot.status, QueryStatus::Success);

        let again = cache.query(QueryKey::community(7), true, fetch).unwrap();
        assert_eq!(again.snapshot().data.as_deref(), Some("hiking-club"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_single_query_is_idle() {
        let cache = QueryCache::new(QueryConfig::default());
        let query = cache
            .query(QueryKey::community(-1), false, || async { Ok(1i64) })
            .unwrap();
        let snapshot = query.snapshot();
        assert!(snapshot.is_idle());
        assert_eq!(snapshot.data, None);
    }

    #[tokio::test]
    async fn test_single_query_error_and_retry() {
        let cache = QueryCache::new(QueryConfig::default());
        let attempts = Arc::new(AtomicUsize::new(0));

        let fetch = {
            let attempts = attempts.clone();
            move || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(Error::Network("offline".into()))
                    } else {
                        Ok(5i64)
                    }
                }
            }
        };

        let mut query = cache.query(QueryKey::discussion(5), true, fetch).unwrap();
        let snapshot = query.settled().await;
        assert_eq!(snapshot.status, QueryStatus::Error);
        assert_eq!(snapshot.data, None);

        assert!(query.retry());
        let snapshot = query.settled().await;
        assert_eq!(snapshot.data, Some(5));
        assert_eq!(snapshot.error, None);
    }
}
