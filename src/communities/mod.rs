//! # Communities Module
//!
//! Resource bindings for the community pages: each method maps scoping
//! parameters to a cache key and a page fetcher, and hands back a query
//! handle from the shared [`QueryCache`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        COMMUNITY QUERIES                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐    │
//! │  │  Community  │  │    Lists    │  │   Admins    │  │ Discussions  │    │
//! │  │             │  │             │  │             │  │              │    │
//! │  │ - By id     │  │ - Subs      │  │ - Ids       │  │ - By id      │    │
//! │  │ - Slug      │  │ - Groups    │  │ - Users     │  │ - Thread     │    │
//! │  │   redirect  │  │ - Places    │  │ - Combined  │  │ - Create     │    │
//! │  │             │  │ - Guides    │  │   loading   │  │   (mutation) │    │
//! │  │             │  │ - Members   │  │             │  │              │    │
//! │  │             │  │ - Events    │  │             │  │              │    │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘    │
//! │         └────────────────┴────────┬───────┴────────────────┘            │
//! │                                   ▼                                     │
//! │                   QueryCache  +  Service (remote traits)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Enablement
//!
//! A binding whose scoping id is missing (or zero) returns a disabled
//! handle. Disabled handles are idle rather than loading, and never call
//! the service.

mod admins;
mod community;
mod discussions;
mod lists;

pub use admins::AdminsQuery;
pub use community::{CommunityQuery, SlugRedirectGuard};
pub use discussions::{MutationStatus, NewDiscussion, NewDiscussionMutation};

use crate::query::QueryCache;
use crate::service::Service;
use crate::users::UserLookup;

/// Query bindings for community resources.
#[derive(Clone)]
pub struct CommunityQueries {
    cache: QueryCache,
    service: Service,
    users: UserLookup,
}

impl CommunityQueries {
    /// Bindings over `cache` and `service`.
    pub fn new(cache: QueryCache, service: Service) -> Self {
        let users = UserLookup::new(cache.clone(), &service);
        Self {
            cache,
            service,
            users,
        }
    }

    /// The shared cache
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The remote service
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Batched user lookup over the same cache
    pub fn users(&self) -> &UserLookup {
        &self.users
    }
}
