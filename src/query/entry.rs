//! # Cache Entries
//!
//! The per-key state machine behind every query handle.
//!
//! ```text
//!            subscribe (enabled, no pages)
//!   Idle ───────────────────────────────► Loading
//!                                            │
//!               ┌──────── fetch ok ──────────┤
//!               ▼                            │ fetch err
//!   Success ◄─ fetch_next_page / retry ─► Error (pages kept)
//!      │
//!      └── invalidate ──► Idle (or Loading when subscribers remain)
//! ```
//!
//! Every mutation happens under the entry lock and bumps a `watch`
//! version so handles can await changes. Fetches run in spawned tasks and
//! carry the entry generation they were started under; a result from an
//! older generation is dropped.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use super::infinite::{InfiniteSnapshot, PageFetcher};
use super::{Page, QueryItem, QueryKey};
use crate::error::{Error, QueryError, Result};

/// Type-erased view of an entry, as held by the cache.
pub(crate) trait CacheEntry: Send + Sync {
    /// Discard pages and errors; refetch from the first page when asked to.
    fn invalidate(self: Arc<Self>, refetch: bool);

    /// Whether a fetch is in flight.
    fn is_fetching(&self) -> bool;

    /// Recover the concrete entry.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Which page a fetch asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    /// The first page (cursor `None`)
    Initial,
    /// A following page
    NextPage(String),
}

impl FetchKind {
    /// Cursor handed to the fetcher
    pub fn cursor(&self) -> Option<String> {
        match self {
            FetchKind::Initial => None,
            FetchKind::NextPage(cursor) => Some(cursor.clone()),
        }
    }
}

/// Classification of a query's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// No data and nothing requested (e.g. disabled)
    Idle,
    /// First page in flight
    Loading,
    /// Last fetch failed
    Error,
    /// At least one page loaded
    Success,
}

struct EntryState<T> {
    pages: Vec<Arc<Page<T>>>,
    fetching: Option<FetchKind>,
    error: Option<QueryError>,
    failed: Option<FetchKind>,
    generation: u64,
    fetcher: Option<PageFetcher<T>>,
}

impl<T> EntryState<T> {
    fn status(&self) -> QueryStatus {
        if self.pages.is_empty() && self.fetching == Some(FetchKind::Initial) {
            QueryStatus::Loading
        } else if self.error.is_some() {
            QueryStatus::Error
        } else if !self.pages.is_empty() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        }
    }

    fn next_cursor(&self) -> Option<&str> {
        self.pages.last().and_then(|page| page.next_cursor())
    }
}

/// Paginated result for one key.
pub(crate) struct InfiniteEntry<T> {
    key: QueryKey,
    state: Mutex<EntryState<T>>,
    changes: watch::Sender<u64>,
}

impl<T: QueryItem> InfiniteEntry<T> {
    pub(crate) fn new(key: QueryKey) -> Arc<Self> {
        let (changes, _) = watch::channel(0);
        Arc::new(Self {
            key,
            state: Mutex::new(EntryState {
                pages: Vec::new(),
                fetching: None,
                error: None,
                failed: None,
                generation: 0,
                fetcher: None,
            }),
            changes,
        })
    }

    pub(crate) fn watch(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Remember the fetcher of the latest enabled subscriber, used to
    /// refetch on invalidation.
    pub(crate) fn set_fetcher(&self, fetcher: &PageFetcher<T>) {
        self.state.lock().fetcher = Some(Arc::clone(fetcher));
    }

    /// Start the first page unless it is loaded or already in flight.
    pub(crate) fn ensure_loaded(self: &Arc<Self>, fetcher: &PageFetcher<T>) -> bool {
        let started = {
            let mut state = self.state.lock();
            if state.pages.is_empty() && state.fetching.is_none() {
                self.start(&mut state, fetcher, FetchKind::Initial);
                true
            } else {
                false
            }
        };
        if started {
            self.notify();
        }
        started
    }

    /// Fetch the page after the last one, if there is one and nothing
    /// is in flight.
    pub(crate) fn fetch_next(self: &Arc<Self>, fetcher: &PageFetcher<T>) -> bool {
        let started = {
            let mut state = self.state.lock();
            if state.fetching.is_some() {
                false
            } else if let Some(cursor) = state.next_cursor().map(str::to_string) {
                self.start(&mut state, fetcher, FetchKind::NextPage(cursor));
                true
            } else {
                false
            }
        };
        if started {
            self.notify();
        }
        started
    }

    /// Re-run the fetch that failed, with the same cursor.
    pub(crate) fn retry(self: &Arc<Self>, fetcher: &PageFetcher<T>) -> bool {
        let started = {
            let mut state = self.state.lock();
            match (&state.fetching, state.failed.clone()) {
                (None, Some(kind)) => {
                    self.start(&mut state, fetcher, kind);
                    true
                }
                _ => false,
            }
        };
        if started {
            self.notify();
        }
        started
    }

    pub(crate) fn snapshot(&self) -> InfiniteSnapshot<T> {
        let state = self.state.lock();
        InfiniteSnapshot {
            pages: state.pages.clone(),
            status: state.status(),
            error: state.error.clone(),
            is_fetching: state.fetching.is_some(),
            is_fetching_next_page: matches!(state.fetching, Some(FetchKind::NextPage(_))),
            has_next_page: state.next_cursor().is_some(),
        }
    }

    fn start(
        self: &Arc<Self>,
        state: &mut EntryState<T>,
        fetcher: &PageFetcher<T>,
        kind: FetchKind,
    ) {
        state.fetching = Some(kind.clone());
        let generation = state.generation;
        let cursor = kind.cursor();

        tracing::debug!(key = %self.key, cursor = ?cursor, "Fetching page");

        let entry = Arc::clone(self);
        let fetch = fetcher(cursor);
        tokio::spawn(async move {
            // A panicking fetch ends as a retryable error.
            let result = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(Error::Internal(format!(
                    "page fetch panicked: {}",
                    panic_message(payload.as_ref())
                ))),
            };
            entry.complete(generation, kind, result);
        });
    }

    fn complete(&self, generation: u64, kind: FetchKind, result: Result<Page<T>>) {
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                tracing::debug!(key = %self.key, "Dropping page fetched before invalidation");
                return;
            }
            state.fetching = None;

            match result {
                Ok(page) => {
                    tracing::debug!(
                        key = %self.key,
                        items = page.items.len(),
                        has_next = page.has_next(),
                        "Page fetched"
                    );
                    if kind == FetchKind::Initial {
                        state.pages.clear();
                    }
                    state.pages.push(Arc::new(page));
                    state.error = None;
                    state.failed = None;
                }
                Err(err) => {
                    tracing::warn!(key = %self.key, error = %err, "Page fetch failed");
                    state.error = Some(QueryError::from(err));
                    state.failed = Some(kind);
                }
            }
        }
        self.notify();
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }
}

impl<T: QueryItem> CacheEntry for InfiniteEntry<T> {
    fn invalidate(self: Arc<Self>, refetch: bool) {
        {
            let mut state = self.state.lock();
            state.generation += 1;
            state.pages.clear();
            state.fetching = None;
            state.error = None;
            state.failed = None;

            if refetch {
                if let Some(fetcher) = state.fetcher.clone() {
                    self.start(&mut state, &fetcher, FetchKind::Initial);
                }
            }
        }
        self.notify();
    }

    fn is_fetching(&self) -> bool {
        self.state.lock().fetching.is_some()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
