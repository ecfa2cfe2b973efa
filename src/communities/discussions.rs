//! # Discussions
//!
//! Discussion and thread queries, and the mutation that posts a new
//! discussion.
//!
//! ```text
//!   mutate(input) ──► create_discussion ──► ok ──► on_success()
//!                                                     │
//!                 invalidate(communityDiscussions/{owner}) ◄┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::query::{InfiniteQuery, Query, QueryCache, QueryKey};
use crate::service::{Discussion, DiscussionsApi, Reply};

/// Input of [`NewDiscussionMutation::mutate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDiscussion {
    /// Title, required
    pub title: String,
    /// Markdown body
    pub content: String,
    /// Community the discussion is posted in
    pub owner_community_id: i64,
}

/// State of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    /// Not run yet
    Idle,
    /// Request in flight
    Loading,
    /// Last run failed
    Error,
    /// Last run succeeded
    Success,
}

struct MutationState {
    status: MutationStatus,
    data: Option<Discussion>,
    error: Option<QueryError>,
}

type SuccessCallback = Box<dyn Fn() + Send + Sync>;

/// Posts new discussions and refreshes the owner's discussion list.
pub struct NewDiscussionMutation {
    cache: QueryCache,
    api: Arc<dyn DiscussionsApi>,
    on_success: Option<SuccessCallback>,
    state: Mutex<MutationState>,
}

impl NewDiscussionMutation {
    /// Create the discussion.
    ///
    /// On success the callback runs first, then every cached discussion
    /// list of the owner community is invalidated.
    pub async fn mutate(&self, input: NewDiscussion) -> Result<Discussion> {
        {
            let mut state = self.state.lock();
            state.status = MutationStatus::Loading;
            state.error = None;
        }

        let result = self
            .api
            .create_discussion(&input.title, &input.content, input.owner_community_id)
            .await;

        match result {
            Ok(discussion) => {
                {
                    let mut state = self.state.lock();
                    state.status = MutationStatus::Success;
                    state.data = Some(discussion.clone());
                }
                if let Some(on_success) = &self.on_success {
                    on_success();
                }
                self.cache
                    .invalidate(&QueryKey::community_discussions(input.owner_community_id));
                Ok(discussion)
            }
            Err(err) => {
                tracing::warn!(
                    owner_community_id = input.owner_community_id,
                    error = %err,
                    "Failed to create discussion"
                );
                let mut state = self.state.lock();
                state.status = MutationStatus::Error;
                state.error = Some(QueryError::from(&err));
                Err(err)
            }
        }
    }

    /// Current status
    pub fn status(&self) -> MutationStatus {
        self.state.lock().status
    }

    /// Discussion created by the last successful run
    pub fn data(&self) -> Option<Discussion> {
        self.state.lock().data.clone()
    }

    /// Error of the last failed run
    pub fn error(&self) -> Option<QueryError> {
        self.state.lock().error.clone()
    }

    /// Back to idle.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.status = MutationStatus::Idle;
        state.data = None;
        state.error = None;
    }
}

impl super::CommunityQueries {
    // ── Discussions ─────────────────────────────────────────────────────

    /// Discussions of a community. Disabled for a zero id.
    pub fn list_discussions(&self, community_id: i64) -> Result<InfiniteQuery<Discussion>> {
        let api = Arc::clone(&self.service.communities);
        self.list(
            QueryKey::community_discussions(community_id),
            community_id != 0,
            move |token| {
                let api = Arc::clone(&api);
                async move { api.list_discussions(community_id, token).await }
            },
        )
    }

    /// A discussion by id.
    pub fn discussion(&self, discussion_id: i64) -> Result<Query<Discussion>> {
        let api = Arc::clone(&self.service.discussions);
        self.cache
            .query(QueryKey::discussion(discussion_id), true, move || {
                let api = Arc::clone(&api);
                async move { api.get_discussion(discussion_id).await }
            })
    }

    /// Replies of a thread.
    pub fn thread(&self, thread_id: i64) -> Result<InfiniteQuery<Reply>> {
        self.thread_when(thread_id, true)
    }

    /// Replies of a thread, fetched only when `enabled`.
    pub fn thread_when(&self, thread_id: i64, enabled: bool) -> Result<InfiniteQuery<Reply>> {
        let api = Arc::clone(&self.service.threads);
        self.list(QueryKey::thread(thread_id), enabled, move |token| {
            let api = Arc::clone(&api);
            async move { api.get_thread(thread_id, token).await }
        })
    }

    /// The new-discussion mutation. `on_success` runs after each successful
    /// post.
    pub fn new_discussion_mutation(
        &self,
        on_success: Option<Box<dyn Fn() + Send + Sync>>,
    ) -> NewDiscussionMutation {
        NewDiscussionMutation {
            cache: self.cache.clone(),
            api: Arc::clone(&self.service.discussions),
            on_success,
            state: Mutex::new(MutationState {
                status: MutationStatus::Idle,
                data: None,
                error: None,
            }),
        }
    }
}
