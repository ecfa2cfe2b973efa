//! # Query Module
//!
//! Cache-key-driven remote data fetching.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          QUERY MODULE                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   view ──► InfiniteQuery<T> / Query<T>   (handle, one per consumer)     │
//! │                    │                                                    │
//! │                    │ subscribe(key)                                     │
//! │                    ▼                                                    │
//! │   ┌──────────────────────────────────────────┐                          │
//! │   │ QueryCache                               │                          │
//! │   │   QueryKey ──► Slot { entry, subscribers,│                          │
//! │   │                       inactive_since }   │                          │
//! │   └──────────────────┬───────────────────────┘                          │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │   InfiniteEntry<T> { pages, in-flight fetch, error, generation }        │
//! │                      │                                                  │
//! │                      │ tokio::spawn(fetch(cursor))                      │
//! │                      ▼                                                  │
//! │               remote service                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - At most one fetch is in flight per key; subscribers share it.
//! - Pages are appended in fetch order and never rewritten.
//! - An empty or absent continuation token is terminal.
//! - Dropping a handle never cancels a shared fetch.

mod cache;
mod entry;
mod infinite;
mod key;
mod page;
mod single;

pub use cache::QueryCache;
pub use entry::{FetchKind, QueryStatus};
pub use infinite::{page_fetcher, InfiniteQuery, InfiniteSnapshot, PageFetcher};
pub use key::{Qualifier, QueryKey, QueryType, Resource};
pub use page::Page;
pub use single::{Query, QuerySnapshot};

/// Bound shared by everything stored in the cache.
pub trait QueryItem: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> QueryItem for T {}
