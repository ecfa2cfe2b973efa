//! Records returned by the remote service.
//!
//! Field names follow the service contract. The data layer only reads
//! the fields it renders.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// User identifier
pub type UserId = i64;

/// A community (a place-based group of users)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub community_id: i64,
    pub name: String,
    /// Canonical slug used in URLs
    pub slug: String,
    pub description: String,
    pub member_count: u32,
    pub admin_count: u32,
    pub created: i64,
}

/// A group inside a community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
}

/// Kind of a community article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleKind {
    /// A place worth visiting
    Place,
    /// A guide written by members
    Guide,
}

/// A place or guide page of a community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub page_id: i64,
    pub kind: ArticleKind,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub last_edited: i64,
}

/// A community event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: i64,
    pub title: String,
    pub slug: String,
    pub start_time: i64,
    pub end_time: i64,
    pub location: Option<String>,
    pub going_count: u32,
}

/// A discussion posted in a community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub discussion_id: i64,
    /// Thread holding the discussion's comments
    pub thread_id: i64,
    pub slug: String,
    pub title: String,
    /// Markdown body
    pub content: String,
    pub creator_user_id: UserId,
    pub owner_community_id: i64,
    pub created: i64,
}

/// A comment or nested reply in a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Thread holding this reply's own replies
    pub thread_id: i64,
    pub content: String,
    pub author_user_id: UserId,
    pub created_time: i64,
    pub num_replies: u32,
}

/// A user profile, as needed for avatars and names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub city: String,
}
