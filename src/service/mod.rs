//! # Service Module
//!
//! Typed request traits for the remote service. Each list call returns one
//! page for a scope id and an optional continuation token.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SERVICE CLIENT                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────┐ ┌───────────────┐ ┌─────────┐ ┌───────┐  │
//! │  │ Communities  │ │  Events  │ │  Discussions  │ │ Threads │ │ Users │  │
//! │  │              │ │          │ │               │ │         │ │       │  │
//! │  │ - get        │ │ - list   │ │ - create      │ │ - get   │ │ - get │  │
//! │  │ - list_*     │ │          │ │ - get         │ │         │ │ batch │  │
//! │  └──────────────┘ └──────────┘ └───────────────┘ └─────────┘ └───────┘  │
//! │                                                                         │
//! │  Service { Arc<dyn …> × 5 }   bundled for the query layer               │
//! │  InMemoryService              implements all five (tests, demo)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod memory;
mod types;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::query::Page;

pub use memory::InMemoryService;
pub use types::{Article, ArticleKind, Community, Discussion, Event, Group, Reply, User, UserId};

/// Community reads
#[async_trait]
pub trait CommunitiesApi: Send + Sync {
    /// A community by id
    async fn get_community(&self, community_id: i64) -> Result<Community>;

    /// Communities below `community_id` (0 lists top-level communities)
    async fn list_communities(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<Community>>;

    /// Groups of a community
    async fn list_groups(&self, community_id: i64, page_token: Option<String>)
        -> Result<Page<Group>>;

    /// Places of a community
    async fn list_places(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<Article>>;

    /// Guides of a community
    async fn list_guides(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<Article>>;

    /// Discussions of a community
    async fn list_discussions(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<Discussion>>;

    /// Admin user ids of a community
    async fn list_admins(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<UserId>>;

    /// Member user ids of a community
    async fn list_members(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<UserId>>;

    /// Ids of users living near a community
    async fn list_nearby_users(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<UserId>>;
}

/// Event reads
#[async_trait]
pub trait EventsApi: Send + Sync {
    /// Events of a community
    async fn list_community_events(
        &self,
        community_id: i64,
        page_token: Option<String>,
        page_size: Option<u32>,
    ) -> Result<Page<Event>>;
}

/// Discussion reads and writes
#[async_trait]
pub trait DiscussionsApi: Send + Sync {
    /// Post a new discussion in a community
    async fn create_discussion(
        &self,
        title: &str,
        content: &str,
        owner_community_id: i64,
    ) -> Result<Discussion>;

    /// A discussion by id
    async fn get_discussion(&self, discussion_id: i64) -> Result<Discussion>;
}

/// Comment thread reads
#[async_trait]
pub trait ThreadsApi: Send + Sync {
    /// Replies of a thread
    async fn get_thread(&self, thread_id: i64, page_token: Option<String>) -> Result<Page<Reply>>;
}

/// Batched user lookup
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// Users by id; unknown ids are absent from the map
    async fn get_users(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, User>>;
}

/// The remote service, one client per resource family.
#[derive(Clone)]
pub struct Service {
    /// Community reads
    pub communities: Arc<dyn CommunitiesApi>,
    /// Event reads
    pub events: Arc<dyn EventsApi>,
    /// Discussion reads and writes
    pub discussions: Arc<dyn DiscussionsApi>,
    /// Thread reads
    pub threads: Arc<dyn ThreadsApi>,
    /// User lookup
    pub users: Arc<dyn UsersApi>,
}

impl Service {
    /// Use one backend for every resource family.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CommunitiesApi + EventsApi + DiscussionsApi + ThreadsApi + UsersApi + 'static,
    {
        Self {
            communities: backend.clone(),
            events: backend.clone(),
            discussions: backend.clone(),
            threads: backend.clone(),
            users: backend,
        }
    }
}
