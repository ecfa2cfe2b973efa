//! # Views
//!
//! Pure view models for the discussion pages. Each view owns the query
//! handles it reads and renders its current state to a tree of [`Node`]s.
//! Rendering never fetches; fetching is driven by the handles and by
//! [`Action`]s the host dispatches back.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              VIEWS                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  DiscussionsSection ── "See more" ──► DiscussionsListPage               │
//! │        │ (community page)                  │ "Load more"                │
//! │        ▼                                   ▼                            │
//! │  DiscussionCard ─────────────────────► DiscussionPage                   │
//! │                                            │                            │
//! │                                            ├── creator (after data)     │
//! │                                            └── CommentTree (2 levels)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod comment_tree;
mod discussion_page;
mod discussions_list;
mod discussions_section;

pub use comment_tree::CommentTree;
pub use discussion_page::DiscussionPage;
pub use discussions_list::DiscussionsListPage;
pub use discussions_section::DiscussionsSection;

use serde::Serialize;

use crate::navigation::{route_to_discussion, Navigator};
use crate::query::InfiniteSnapshot;
use crate::service::{Discussion, UserId};

// ============================================================================
// LABELS
// ============================================================================

/// Title of the discussions section
pub const DISCUSSIONS_TITLE: &str = "Discussions";

/// Shown when a community has no discussions
pub const DISCUSSIONS_EMPTY_STATE: &str = "No discussions at the moment.";

/// Button leading to the full discussions list
pub const SEE_MORE_DISCUSSIONS_LABEL: &str = "See more discussions";

/// Button loading the next page of discussions
pub const LOAD_MORE_DISCUSSIONS_LABEL: &str = "Load more discussions";

/// Label above a discussion's creator
pub const ADDED_BY: &str = "Added by";

/// Label of the back button
pub const PREVIOUS_PAGE: &str = "Previous page";

/// Shown when a creator or author cannot be resolved
pub const UNKNOWN_USER: &str = "Unknown user";

/// Test id of the creator placeholder
pub const CREATOR_LOADING_TEST_ID: &str = "creator-loading-state";

/// Title of the comment tree
pub const COMMENTS: &str = "Comments";

/// Shown when a discussion has no comments
pub const NO_COMMENTS: &str = "No comments yet.";

/// Button loading more comments
pub const LOAD_MORE_COMMENTS_LABEL: &str = "Load more comments";

// ============================================================================
// NODES
// ============================================================================

/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Action {
    /// Push a route
    Navigate(String),
    /// Go back in history
    GoBack,
    /// Fetch the next page of the owning list
    LoadMore,
}

impl Action {
    /// Apply a navigation action. Returns `false` for [`Action::LoadMore`],
    /// which belongs to the view that rendered it.
    pub fn navigate(&self, navigator: &dyn Navigator) -> bool {
        match self {
            Action::Navigate(route) => {
                navigator.push(route);
                true
            }
            Action::GoBack => {
                navigator.go_back();
                true
            }
            Action::LoadMore => false,
        }
    }
}

/// A rendered element.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Heading of a page section
    SectionTitle { text: String },
    /// Heading of a page
    PageTitle { text: String },
    /// Indeterminate progress indicator
    Progress,
    /// Placeholder for content still loading
    Skeleton { test_id: String },
    /// Non-fatal error banner
    Alert { message: String },
    /// Plain text
    Text { text: String },
    /// Markdown body
    Markdown { source: String },
    /// Horizontal rule
    Divider,
    /// A clickable button
    Button { label: String, action: Action },
    /// Icon button returning to the previous page
    BackButton { label: String, action: Action },
    /// A user's avatar
    Avatar {
        user_id: Option<UserId>,
        name: Option<String>,
        avatar_url: Option<String>,
    },
    /// Summary card of a discussion
    DiscussionCard {
        key: String,
        title: String,
        excerpt: String,
        action: Action,
    },
    /// A comment and its rendered replies
    Comment {
        author: String,
        content: String,
        created: String,
        replies: Vec<Node>,
    },
    /// The comments of a discussion
    CommentTree { children: Vec<Node> },
}

/// Maximum characters of a card excerpt
const EXCERPT_CHARS: usize = 140;

impl Node {
    /// Card for `discussion`, keyed by its thread id.
    pub fn discussion_card(discussion: &Discussion) -> Self {
        let mut excerpt: String = discussion.content.chars().take(EXCERPT_CHARS).collect();
        if discussion.content.chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }
        Node::DiscussionCard {
            key: format!("discussioncard-{}", discussion.thread_id),
            title: discussion.title.clone(),
            excerpt,
            action: Action::Navigate(route_to_discussion(
                discussion.discussion_id,
                &discussion.slug,
            )),
        }
    }

    /// The action of a button, back button or card.
    pub fn action(&self) -> Option<&Action> {
        match self {
            Node::Button { action, .. }
            | Node::BackButton { action, .. }
            | Node::DiscussionCard { action, .. } => Some(action),
            _ => None,
        }
    }
}

/// Find the first button labelled `label`, searching nested nodes.
pub fn find_button<'a>(nodes: &'a [Node], label: &str) -> Option<&'a Action> {
    nodes.iter().find_map(|node| match node {
        Node::Button { label: l, action } | Node::BackButton { label: l, action }
            if l == label =>
        {
            Some(action)
        }
        Node::Comment { replies, .. } => find_button(replies, label),
        Node::CommentTree { children } => find_button(children, label),
        _ => None,
    })
}

/// Alert, progress, cards or empty text for a discussions list.
fn render_discussion_list(snapshot: &InfiniteSnapshot<Discussion>, nodes: &mut Vec<Node>) {
    if let Some(error) = &snapshot.error {
        nodes.push(Node::Alert {
            message: error.message.clone(),
        });
    }

    if snapshot.is_loading() {
        nodes.push(Node::Progress);
    } else if snapshot.has_items() {
        nodes.extend(snapshot.items().map(Node::discussion_card));
    } else {
        nodes.push(Node::Text {
            text: DISCUSSIONS_EMPTY_STATE.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::MemoryNavigator;

    fn discussion(content: &str) -> Discussion {
        Discussion {
            discussion_id: 5,
            thread_id: 50,
            slug: "welcome".into(),
            title: "Welcome".into(),
            content: content.into(),
            creator_user_id: 1,
            owner_community_id: 7,
            created: 0,
        }
    }

    #[test]
    fn test_card_key_and_route() {
        let card = Node::discussion_card(&discussion("Hello"));
        match &card {
            Node::DiscussionCard { key, excerpt, .. } => {
                assert_eq!(key, "discussioncard-50");
                assert_eq!(excerpt, "Hello");
            }
            other => panic!("unexpected node {other:?}"),
        }
        assert_eq!(
            card.action(),
            Some(&Action::Navigate("/discussion/5/welcome".into()))
        );
    }

    #[test]
    fn test_long_excerpt_is_truncated() {
        let card = Node::discussion_card(&discussion(&"a".repeat(500)));
        let Node::DiscussionCard { excerpt, .. } = card else {
            panic!("expected a card");
        };
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 1);
    }

    #[test]
    fn test_actions_drive_navigator() {
        let navigator = MemoryNavigator::at("/community/7/hiking-club");
        assert!(Action::Navigate("/discussion/5/welcome".into()).navigate(&navigator));
        assert!(Action::GoBack.navigate(&navigator));
        assert!(!Action::LoadMore.navigate(&navigator));
        assert_eq!(navigator.location().as_deref(), Some("/community/7/hiking-club"));
    }

    #[test]
    fn test_nodes_serialize_tagged() {
        let node = Node::Button {
            label: SEE_MORE_DISCUSSIONS_LABEL.into(),
            action: Action::Navigate("/community/7/hiking-club/discussions".into()),
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "button");
        assert_eq!(json["action"]["kind"], "navigate");
        assert_eq!(json["action"]["target"], "/community/7/hiking-club/discussions");
    }
}
