//! Discussions section of the community page.

use super::{
    render_discussion_list, Action, Node, DISCUSSIONS_TITLE, SEE_MORE_DISCUSSIONS_LABEL,
};
use crate::communities::CommunityQueries;
use crate::error::Result;
use crate::navigation::{route_to_community, CommunityTab};
use crate::query::{InfiniteQuery, InfiniteSnapshot};
use crate::service::{Community, Discussion};

/// The first page of a community's discussions, with a link to the rest.
///
/// The section never loads further pages itself; "See more" leads to the
/// full list.
pub struct DiscussionsSection {
    community: Community,
    discussions: InfiniteQuery<Discussion>,
}

impl DiscussionsSection {
    /// Subscribe to the discussions of `community`.
    pub fn new(queries: &CommunityQueries, community: Community) -> Result<Self> {
        let discussions = queries.list_discussions(community.community_id)?;
        Ok(Self {
            community,
            discussions,
        })
    }

    /// The underlying list query
    pub fn discussions(&self) -> &InfiniteQuery<Discussion> {
        &self.discussions
    }

    /// Wait until the list settles.
    pub async fn settled(&mut self) -> InfiniteSnapshot<Discussion> {
        self.discussions.settled().await
    }

    /// Render the current state.
    pub fn render(&self) -> Vec<Node> {
        let snapshot = self.discussions.snapshot();
        let mut nodes = vec![Node::SectionTitle {
            text: DISCUSSIONS_TITLE.to_string(),
        }];

        render_discussion_list(&snapshot, &mut nodes);

        if snapshot.has_next_page {
            nodes.push(Node::Button {
                label: SEE_MORE_DISCUSSIONS_LABEL.to_string(),
                action: Action::Navigate(route_to_community(
                    self.community.community_id,
                    &self.community.slug,
                    Some(CommunityTab::Discussions),
                )),
            });
        }
        nodes
    }
}
