//! # Query Cache
//!
//! The in-process cache service: `QueryKey → entry + subscriber count`.
//!
//! All entries live in one concurrent map (DashMap). The cache is cheap to
//! clone; clones share the same entries.
//!
//! ## Entry Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CACHE ENTRY LIFECYCLE                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  first subscribe ──► created, subscribers = 1                           │
//! │  more subscribers ─► subscribers += 1 (share pages and fetches)         │
//! │  handle dropped ───► subscribers -= 1; at 0 mark inactive_since         │
//! │  invalidate ───────► pages discarded; refetch if subscribers > 0        │
//! │  collect_garbage ──► evict inactive for longer than gc_time             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Weak};
use std::time::Instant;

use dashmap::DashMap;
use tokio::task::JoinHandle;

use super::entry::{CacheEntry, InfiniteEntry};
use super::infinite::{InfiniteQuery, PageFetcher};
use super::{QueryItem, QueryKey};
use crate::config::QueryConfig;
use crate::error::{Error, Result};

struct Slot {
    entry: Arc<dyn CacheEntry>,
    subscribers: usize,
    inactive_since: Option<Instant>,
}

struct CacheInner {
    entries: DashMap<QueryKey, Slot>,
    config: QueryConfig,
}

impl CacheInner {
    fn release(&self, key: &QueryKey) {
        if let Some(mut slot) = self.entries.get_mut(key) {
            slot.subscribers = slot.subscribers.saturating_sub(1);
            if slot.subscribers == 0 {
                slot.inactive_since = Some(Instant::now());
            }
        }
    }

    fn collect_garbage(&self) -> usize {
        let Some(gc_time) = self.config.gc_time else {
            return 0;
        };

        let before = self.entries.len();
        self.entries.retain(|key, slot| {
            let expired = slot.subscribers == 0
                && !slot.entry.is_fetching()
                && slot
                    .inactive_since
                    .is_some_and(|since| since.elapsed() >= gc_time);
            if expired {
                tracing::debug!(key = %key, "Evicting inactive cache entry");
            }
            !expired
        });
        before.saturating_sub(self.entries.len())
    }
}

/// Keeps a key's subscriber count up while a handle lives.
pub(crate) struct Subscription {
    cache: Weak<CacheInner>,
    key: QueryKey,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.release(&self.key);
        }
    }
}

/// Shared page cache keyed by [`QueryKey`].
///
/// Fetches are spawned on the current Tokio runtime, so subscribing must
/// happen inside one.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    /// Create an empty cache.
    pub fn new(config: QueryConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                config,
            }),
        }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    /// Subscribe to a paginated query.
    ///
    /// When `enabled` and the entry holds no pages, the first page is
    /// fetched unless that fetch is already in flight. A disabled handle
    /// only observes the entry.
    pub fn infinite<T: QueryItem>(
        &self,
        key: QueryKey,
        fetcher: PageFetcher<T>,
        enabled: bool,
    ) -> Result<InfiniteQuery<T>> {
        let entry = self.acquire::<T>(&key)?;
        let subscription = Subscription {
            cache: Arc::downgrade(&self.inner),
            key: key.clone(),
        };

        if enabled {
            entry.set_fetcher(&fetcher);
            entry.ensure_loaded(&fetcher);
        }

        Ok(InfiniteQuery::new(key, entry, fetcher, enabled, subscription))
    }

    fn acquire<T: QueryItem>(&self, key: &QueryKey) -> Result<Arc<InfiniteEntry<T>>> {
        let mut slot = self.inner.entries.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(key = %key, "Creating cache entry");
            let entry: Arc<dyn CacheEntry> = InfiniteEntry::<T>::new(key.clone());
            Slot {
                entry,
                subscribers: 0,
                inactive_since: None,
            }
        });

        let entry = Arc::clone(&slot.entry)
            .into_any()
            .downcast::<InfiniteEntry<T>>()
            .map_err(|_| Error::CacheTypeMismatch(key.to_string()))?;

        slot.subscribers += 1;
        slot.inactive_since = None;
        Ok(entry)
    }

    /// Invalidate every entry matching `filter` (see [`QueryKey::matches`]).
    ///
    /// Pages are discarded and results still in flight are dropped. Entries
    /// with live subscribers refetch their first page at once; the others
    /// refetch on their next subscription. Returns the number of entries hit.
    pub fn invalidate(&self, filter: &QueryKey) -> usize {
        let matched: Vec<(Arc<dyn CacheEntry>, bool)> = self
            .inner
            .entries
            .iter()
            .filter(|slot| slot.key().matches(filter))
            .map(|slot| (Arc::clone(&slot.entry), slot.subscribers > 0))
            .collect();

        tracing::info!(filter = %filter, entries = matched.len(), "Invalidating queries");

        let count = matched.len();
        for (entry, refetch) in matched {
            entry.invalidate(refetch);
        }
        count
    }

    /// Evict entries with no subscribers that have been inactive for the
    /// configured `gc_time`. Returns the number evicted.
    pub fn collect_garbage(&self) -> usize {
        self.inner.collect_garbage()
    }

    /// Run [`collect_garbage`](Self::collect_garbage) every `gc_interval`.
    ///
    /// The task ends once every clone of the cache is dropped.
    pub fn spawn_gc(&self) -> JoinHandle<()> {
        let cache = Arc::downgrade(&self.inner);
        let period = self.inner.config.gc_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let evicted = cache.collect_garbage();
                if evicted > 0 {
                    tracing::debug!(evicted, "Cache garbage collection");
                }
            }
        })
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.entries.contains_key(key)
    }

    /// Live handles on `key`.
    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.inner
            .entries
            .get(key)
            .map(|slot| slot.subscribers)
            .unwrap_or(0)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}
