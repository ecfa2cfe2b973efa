//! Full discussions list of a community (the "discussions" tab).

use super::{
    render_discussion_list, Action, Node, DISCUSSIONS_TITLE, LOAD_MORE_DISCUSSIONS_LABEL,
};
use crate::communities::CommunityQueries;
use crate::error::Result;
use crate::navigation::Navigator;
use crate::query::{InfiniteQuery, InfiniteSnapshot};
use crate::service::Discussion;

/// Every loaded page of a community's discussions, with "load more".
pub struct DiscussionsListPage {
    discussions: InfiniteQuery<Discussion>,
}

impl DiscussionsListPage {
    /// Subscribe to the discussions of `community_id`. Shares its cache
    /// entry with the community page's section.
    pub fn new(queries: &CommunityQueries, community_id: i64) -> Result<Self> {
        Ok(Self {
            discussions: queries.list_discussions(community_id)?,
        })
    }

    /// Wait until the list settles.
    pub async fn settled(&mut self) -> InfiniteSnapshot<Discussion> {
        self.discussions.settled().await
    }

    /// Request the next page.
    pub fn load_more(&self) -> bool {
        self.discussions.fetch_next_page()
    }

    /// Handle a pressed button or card.
    pub fn perform(&self, action: &Action, navigator: &dyn Navigator) -> bool {
        match action {
            Action::LoadMore => self.load_more(),
            other => other.navigate(navigator),
        }
    }

    /// Render the current state.
    pub fn render(&self) -> Vec<Node> {
        let snapshot = self.discussions.snapshot();
        let mut nodes = vec![Node::SectionTitle {
            text: DISCUSSIONS_TITLE.to_string(),
        }];

        render_discussion_list(&snapshot, &mut nodes);

        if snapshot.is_fetching_next_page {
            nodes.push(Node::Progress);
        } else if snapshot.has_next_page {
            nodes.push(Node::Button {
                label: LOAD_MORE_DISCUSSIONS_LABEL.to_string(),
                action: Action::LoadMore,
            });
        }
        nodes
    }
}
