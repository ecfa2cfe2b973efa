//! # Gather Core
//!
//! The community discussion data layer of the Gather client: a paginated
//! query cache, typed bindings for community resources, and pure view
//! models for the discussion pages.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         GATHER CORE MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                            Views                                │    │
//! │  │  DiscussionsSection · DiscussionsListPage · DiscussionPage      │    │
//! │  └───────────────┬──────────────────────────────┬──────────────────┘    │
//! │                  │                              │                       │
//! │  ┌───────────────▼─────────────┐  ┌─────────────▼───────────────┐       │
//! │  │        Communities          │  │         Navigation          │       │
//! │  │ - Community + slug guard    │  │ - Navigator trait           │       │
//! │  │ - Lists (groups, events...) │  │ - Route builders            │       │
//! │  │ - Admins + users            │  │ - Route params              │       │
//! │  │ - Discussions + mutation    │  └─────────────────────────────┘       │
//! │  └───────────────┬─────────────┘                                        │
//! │                  │                                                      │
//! │  ┌───────────────▼─────────────┐  ┌─────────────────────────────┐       │
//! │  │           Query             │  │          Service            │       │
//! │  │ - QueryKey registry         │──► - Async traits per family   │       │
//! │  │ - QueryCache (DashMap)      │  │ - InMemoryService           │       │
//! │  │ - InfiniteQuery / Query     │  └─────────────────────────────┘       │
//! │  └─────────────────────────────┘                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Cache configuration from the environment
//! - [`query`] - Cache keys, pages, the query cache and query handles
//! - [`service`] - Remote service traits and the in-memory service
//! - [`users`] - Batched user lookup
//! - [`navigation`] - Routes and the navigation collaborator
//! - [`communities`] - Community resource bindings
//! - [`views`] - Discussion view models
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use gather_core::{GatherCore, QueryConfig, Service, InMemoryService};
//!
//! let core = GatherCore::new(
//!     Service::from_backend(Arc::new(InMemoryService::demo())),
//!     QueryConfig::from_env(),
//! );
//! let mut page = gather_core::views::DiscussionPage::new(core.queries(), 100)?;
//! page.settled().await?;
//! println!("{}", serde_json::to_string_pretty(&page.render())?);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod communities;
pub mod config;
pub mod error;
pub mod navigation;
pub mod query;
pub mod service;
/// Timestamp helpers and date formatting.
pub mod time;
pub mod users;
pub mod views;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use communities::CommunityQueries;
pub use config::QueryConfig;
pub use error::{Error, QueryError, Result};
pub use navigation::{Navigator, RouteParams};
pub use query::{InfiniteQuery, Query, QueryCache, QueryKey, QueryStatus};
pub use service::{InMemoryService, Service};

// ============================================================================
// CORE INSTANCE
// ============================================================================

use tokio::task::JoinHandle;

/// A query cache with its bindings and background garbage collection.
///
/// ## Lifecycle
///
/// ```text
///   new() ──► cache + bindings ──► spawn GC (when gc_time is set)
///     │
///     ▼
///   views subscribe through queries() ... handles dropped
///     │
///     ▼
///   drop / shutdown() ──► GC task aborted
/// ```
pub struct GatherCore {
    queries: CommunityQueries,
    gc: Option<JoinHandle<()>>,
}

impl GatherCore {
    /// Build the core. Must run inside a Tokio runtime.
    pub fn new(service: Service, config: QueryConfig) -> Self {
        tracing::info!("Initializing Gather Core v{}", version());

        let evicts = config.gc_time.is_some();
        let cache = QueryCache::new(config);
        let gc = evicts.then(|| cache.spawn_gc());

        Self {
            queries: CommunityQueries::new(cache, service),
            gc,
        }
    }

    /// Resource bindings
    pub fn queries(&self) -> &CommunityQueries {
        &self.queries
    }

    /// The shared cache
    pub fn cache(&self) -> &QueryCache {
        self.queries.cache()
    }

    /// Stop background garbage collection.
    pub fn shutdown(&mut self) {
        if let Some(gc) = self.gc.take() {
            gc.abort();
            tracing::info!("Gather Core shutdown complete");
        }
    }
}

impl Drop for GatherCore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Gather Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
