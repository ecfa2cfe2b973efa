//! # Comment Tree
//!
//! Comments of a discussion, two levels deep. Top-level comments page
//! through the discussion's thread; each comment with replies gets its own
//! thread query keyed by the comment's thread id.
//!
//! ```text
//!   thread(discussion.thread_id)        ── top-level comments, load more
//!     └── thread(comment.thread_id)     ── replies (num_replies > 0)
//! ```
//!
//! Authors resolve in batches: each refresh looks up only the ids that no
//! earlier batch covers, so loading another page never refetches users
//! already known.

use std::collections::BTreeMap;

use super::{Action, Node, COMMENTS, LOAD_MORE_COMMENTS_LABEL, NO_COMMENTS, UNKNOWN_USER};
use crate::communities::CommunityQueries;
use crate::error::Result;
use crate::query::{InfiniteQuery, InfiniteSnapshot};
use crate::service::{Reply, UserId};
use crate::time::format_date;
use crate::users::{UserLookup, UsersQuery};

/// Comments and replies of one discussion thread.
pub struct CommentTree {
    queries: CommunityQueries,
    thread: InfiniteQuery<Reply>,
    replies: BTreeMap<i64, InfiniteQuery<Reply>>,
    lookup: UserLookup,
    authors: Vec<UsersQuery>,
}

impl CommentTree {
    /// Subscribe to the comments of `thread_id`.
    pub fn new(queries: &CommunityQueries, thread_id: i64) -> Result<Self> {
        let lookup = queries.users().clone();
        Ok(Self {
            queries: queries.clone(),
            thread: queries.thread(thread_id)?,
            replies: BTreeMap::new(),
            authors: Vec::new(),
            lookup,
        })
    }

    /// Subscribe to replies of newly loaded comments and look up their new
    /// authors. Call after each state change.
    pub fn refresh(&mut self) -> Result<()> {
        for comment in self.thread.snapshot().items() {
            if comment.num_replies > 0 && !self.replies.contains_key(&comment.thread_id) {
                let replies = self.queries.thread(comment.thread_id)?;
                self.replies.insert(comment.thread_id, replies);
            }
        }

        let unseen: Vec<UserId> = self
            .author_ids()
            .into_iter()
            .filter(|id| !self.authors.iter().any(|batch| batch.ids().contains(id)))
            .collect();
        if !unseen.is_empty() {
            self.authors.push(self.lookup.users(&unseen, true)?);
        }
        Ok(())
    }

    /// Request more top-level comments.
    pub fn load_more(&self) -> bool {
        self.thread.fetch_next_page()
    }

    /// Wait until comments, replies and authors have settled.
    pub async fn settled(&mut self) -> Result<InfiniteSnapshot<Reply>> {
        self.thread.settled().await;
        self.refresh()?;
        for replies in self.replies.values_mut() {
            replies.settled().await;
        }
        self.refresh()?;
        for batch in &mut self.authors {
            batch.settled().await;
        }
        Ok(self.thread.snapshot())
    }

    fn author_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self
            .thread
            .snapshot()
            .items()
            .map(|comment| comment.author_user_id)
            .collect();
        for replies in self.replies.values() {
            ids.extend(replies.snapshot().items().map(|reply| reply.author_user_id));
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn author_name(&self, user_id: UserId) -> String {
        self.authors
            .iter()
            .find_map(|batch| batch.get(user_id))
            .map(|user| user.name)
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    fn comment(&self, reply: &Reply, replies: Vec<Node>) -> Node {
        Node::Comment {
            author: self.author_name(reply.author_user_id),
            content: reply.content.clone(),
            created: format_date(reply.created_time),
            replies,
        }
    }

    fn render_replies(&self, comment: &Reply) -> Vec<Node> {
        let Some(query) = self.replies.get(&comment.thread_id) else {
            return Vec::new();
        };
        let snapshot = query.snapshot();
        let mut nodes = Vec::new();
        if let Some(error) = &snapshot.error {
            nodes.push(Node::Alert {
                message: error.message.clone(),
            });
        }
        if snapshot.is_loading() {
            nodes.push(Node::Progress);
        } else {
            nodes.extend(snapshot.items().map(|reply| self.comment(reply, Vec::new())));
        }
        nodes
    }

    /// Render the current state as a [`Node::CommentTree`].
    pub fn render(&self) -> Node {
        let snapshot = self.thread.snapshot();
        let mut children = vec![Node::SectionTitle {
            text: COMMENTS.to_string(),
        }];

        if let Some(error) = &snapshot.error {
            children.push(Node::Alert {
                message: error.message.clone(),
            });
        }

        if snapshot.is_loading() {
            children.push(Node::Progress);
        } else if snapshot.has_items() {
            children.extend(
                snapshot
                    .items()
                    .map(|comment| self.comment(comment, self.render_replies(comment))),
            );
        } else {
            children.push(Node::Text {
                text: NO_COMMENTS.to_string(),
            });
        }

        if snapshot.is_fetching_next_page {
            children.push(Node::Progress);
        } else if snapshot.has_next_page {
            children.push(Node::Button {
                label: LOAD_MORE_COMMENTS_LABEL.to_string(),
                action: Action::LoadMore,
            });
        }

        Node::CommentTree { children }
    }
}
