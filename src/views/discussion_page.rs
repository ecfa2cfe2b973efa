//! # Discussion Page
//!
//! A single discussion with its creator and comments.
//!
//! ```text
//!   discussion(id) ──ok──► user(creator_user_id)      (disabled until then)
//!                    └───► CommentTree(thread_id)
//! ```
//!
//! When the discussion fails to load, only the error banner renders and
//! the creator lookup stays disabled.

use super::{
    Action, CommentTree, Node, ADDED_BY, CREATOR_LOADING_TEST_ID, PREVIOUS_PAGE, UNKNOWN_USER,
};
use crate::communities::CommunityQueries;
use crate::error::Result;
use crate::navigation::Navigator;
use crate::query::{Query, QuerySnapshot};
use crate::service::{Discussion, UserId};
use crate::time::created_at_label;
use crate::users::{UserLookup, UsersQuery};

/// View model of the discussion page.
pub struct DiscussionPage {
    queries: CommunityQueries,
    discussion: Query<Discussion>,
    lookup: UserLookup,
    creator: UsersQuery,
    comments: Option<CommentTree>,
}

impl DiscussionPage {
    /// Subscribe to discussion `discussion_id`.
    pub fn new(queries: &CommunityQueries, discussion_id: i64) -> Result<Self> {
        let lookup = queries.users().clone();
        Ok(Self {
            queries: queries.clone(),
            discussion: queries.discussion(discussion_id)?,
            creator: lookup.user(None)?,
            lookup,
            comments: None,
        })
    }

    /// Current state of the discussion itself.
    pub fn discussion(&self) -> QuerySnapshot<Discussion> {
        self.discussion.snapshot()
    }

    /// The creator lookup
    pub fn creator(&self) -> &UsersQuery {
        &self.creator
    }

    /// Start the dependent queries once the discussion has loaded. Call
    /// after each state change.
    pub fn refresh(&mut self) -> Result<()> {
        let Some(discussion) = self.discussion.snapshot().data else {
            return Ok(());
        };

        if !self.creator_is_current(discussion.creator_user_id) {
            self.creator = self.lookup.user(Some(discussion.creator_user_id))?;
        }
        match &mut self.comments {
            Some(comments) => comments.refresh()?,
            None => {
                self.comments = Some(CommentTree::new(&self.queries, discussion.thread_id)?);
            }
        }
        Ok(())
    }

    /// Wait until the discussion, its creator and its comments settle.
    pub async fn settled(&mut self) -> Result<QuerySnapshot<Discussion>> {
        let snapshot = self.discussion.settled().await;
        self.refresh()?;
        self.creator.settled().await;
        if let Some(comments) = &mut self.comments {
            comments.settled().await?;
        }
        Ok(snapshot)
    }

    /// Handle a pressed button.
    pub fn perform(&self, action: &Action, navigator: &dyn Navigator) -> bool {
        match action {
            Action::LoadMore => self
                .comments
                .as_ref()
                .is_some_and(|comments| comments.load_more()),
            other => other.navigate(navigator),
        }
    }

    fn creator_is_current(&self, creator_user_id: UserId) -> bool {
        self.creator.ids() == [creator_user_id]
    }

    fn render_creator(&self, discussion: &Discussion, nodes: &mut Vec<Node>) {
        let current = self.creator_is_current(discussion.creator_user_id);
        let user = if current {
            self.creator.get(discussion.creator_user_id)
        } else {
            None
        };

        nodes.push(Node::Avatar {
            user_id: user.as_ref().map(|user| user.user_id),
            name: user.as_ref().map(|user| user.name.clone()),
            avatar_url: user.as_ref().and_then(|user| user.avatar_url.clone()),
        });

        if !current || self.creator.is_loading() {
            nodes.push(Node::Skeleton {
                test_id: CREATOR_LOADING_TEST_ID.to_string(),
            });
        } else {
            nodes.push(Node::Text {
                text: user
                    .map(|user| user.name)
                    .unwrap_or_else(|| UNKNOWN_USER.to_string()),
            });
        }
    }

    /// Render the current state.
    pub fn render(&self) -> Vec<Node> {
        let snapshot = self.discussion.snapshot();
        let mut nodes = Vec::new();

        if let Some(error) = &snapshot.error {
            nodes.push(Node::Alert {
                message: error.message.clone(),
            });
        }

        if snapshot.is_loading() {
            nodes.push(Node::Progress);
            return nodes;
        }
        let Some(discussion) = snapshot.data else {
            return nodes;
        };

        nodes.push(Node::BackButton {
            label: PREVIOUS_PAGE.to_string(),
            action: Action::GoBack,
        });
        nodes.push(Node::PageTitle {
            text: discussion.title.clone(),
        });
        nodes.push(Node::Divider);
        nodes.push(Node::Markdown {
            source: discussion.content.clone(),
        });
        nodes.push(Node::Text {
            text: ADDED_BY.to_string(),
        });
        self.render_creator(&discussion, &mut nodes);
        nodes.push(Node::Text {
            text: created_at_label(discussion.created),
        });
        nodes.push(Node::Divider);
        if let Some(comments) = &self.comments {
            nodes.push(comments.render());
        }
        nodes
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::QueryConfig;
    use crate::error::Error;
    use crate::navigation::MemoryNavigator;
    use crate::query::QueryCache;
    use crate::service::{InMemoryService, Service};
    use crate::views::find_button;

    fn setup() -> (Arc<InMemoryService>, CommunityQueries) {
        let backend = Arc::new(InMemoryService::demo());
        let cache = QueryCache::new(QueryConfig::default().without_eviction());
        let queries = CommunityQueries::new(cache, Service::from_backend(Arc::clone(&backend)));
        (backend, queries)
    }

    #[tokio::test]
    async fn test_full_render_order() {
        let (_, queries) = setup();
        let mut page = DiscussionPage::new(&queries, 100).unwrap();
        assert_eq!(page.render(), vec![Node::Progress]);

        page.settled().await.unwrap();
        let nodes = page.render();
        assert_eq!(
            nodes[..5],
            [
                Node::BackButton {
                    label: PREVIOUS_PAGE.into(),
                    action: Action::GoBack
                },
                Node::PageTitle { text: "Trail report #1".into() },
                Node::Divider,
                Node::Markdown { source: "Notes from hike number 1.".into() },
                Node::Text { text: ADDED_BY.into() },
            ]
        );
        assert!(matches!(&nodes[5], Node::Avatar { user_id: Some(1), .. }));
        assert_eq!(nodes[6], Node::Text { text: "Ana Costa".into() });
        assert_eq!(nodes[7], Node::Text { text: "Created at Jan 5, 2021".into() });
        assert_eq!(nodes[8], Node::Divider);
        assert!(matches!(nodes[9], Node::CommentTree { .. }));
        assert_eq!(nodes.len(), 10);
    }

    #[tokio::test]
    async fn test_creator_skeleton_while_loading() {
        let (backend, queries) = setup();
        let mut page = DiscussionPage::new(&queries, 101).unwrap();
        page.discussion.settled().await;

        // Data arrived but the dependent lookup has not started yet.
        let skeleton = Node::Skeleton {
            test_id: CREATOR_LOADING_TEST_ID.into(),
        };
        assert!(page.render().contains(&skeleton));

        backend.hold();
        page.refresh().unwrap();
        assert!(page.creator().is_loading());
        assert!(page.render().contains(&skeleton));

        backend.release();
        page.settled().await.unwrap();
        assert!(!page.render().contains(&skeleton));
        assert!(page.render().contains(&Node::Text { text: "Ben Okafor".into() }));
    }

    #[tokio::test]
    async fn test_unknown_creator() {
        let (backend, queries) = setup();
        backend.add_discussion(Discussion {
            discussion_id: 9,
            thread_id: 90,
            slug: "orphan".into(),
            title: "Orphan".into(),
            content: String::new(),
            creator_user_id: 404,
            owner_community_id: 7,
            created: 0,
        });

        let mut page = DiscussionPage::new(&queries, 9).unwrap();
        page.settled().await.unwrap();
        let nodes = page.render();
        assert!(nodes.contains(&Node::Text { text: UNKNOWN_USER.into() }));
        assert!(matches!(&nodes[5], Node::Avatar { user_id: None, .. }));
    }

    #[tokio::test]
    async fn test_failure_renders_banner_only() {
        let (backend, queries) = setup();
        backend.fail_next("get_discussion", Error::Network("connection reset".into()));

        let mut page = DiscussionPage::new(&queries, 100).unwrap();
        page.settled().await.unwrap();

        assert_eq!(
            page.render(),
            vec![Node::Alert {
                message: "Network error: connection reset".into()
            }]
        );
        assert!(!page.creator().is_enabled());
        assert_eq!(backend.calls("get_users"), 0);
    }

    #[tokio::test]
    async fn test_back_button_goes_back() {
        let (_, queries) = setup();
        let navigator = MemoryNavigator::at("/community/7/hiking-club");
        navigator.push("/discussion/100/trail-report-1");

        let mut page = DiscussionPage::new(&queries, 100).unwrap();
        page.settled().await.unwrap();
        let action = find_button(&page.render(), PREVIOUS_PAGE).cloned().unwrap();
        assert!(page.perform(&action, &navigator));
        assert_eq!(navigator.location().as_deref(), Some("/community/7/hiking-club"));
    }
}
