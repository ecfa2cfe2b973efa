//! # Navigation
//!
//! Route construction and the navigation collaborator. The data layer
//! only issues `push`, `go_back` and `replace`; routing itself belongs to
//! the host application.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Base path of community pages
pub const COMMUNITY_BASE_ROUTE: &str = "/community";

/// Base path of discussion pages
pub const DISCUSSION_BASE_ROUTE: &str = "/discussion";

/// Navigation actions available to views.
pub trait Navigator: Send + Sync {
    /// Open a new location
    fn push(&self, path: &str);

    /// Return to the previous location
    fn go_back(&self);

    /// Swap the current location without adding a history entry
    fn replace(&self, path: &str);
}

/// Tab of a community page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityTab {
    /// Full discussions list
    Discussions,
    /// Full events list
    Events,
    /// Places
    Places,
    /// Guides
    Guides,
    /// Groups
    Groups,
    /// Members and admins
    Members,
}

impl CommunityTab {
    /// Path segment of the tab
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunityTab::Discussions => "discussions",
            CommunityTab::Events => "events",
            CommunityTab::Places => "places",
            CommunityTab::Guides => "guides",
            CommunityTab::Groups => "groups",
            CommunityTab::Members => "members",
        }
    }
}

impl fmt::Display for CommunityTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `/community/{id}/{slug}[/{tab}]`
pub fn route_to_community(community_id: i64, slug: &str, tab: Option<CommunityTab>) -> String {
    match tab {
        Some(tab) => format!("{COMMUNITY_BASE_ROUTE}/{community_id}/{slug}/{tab}"),
        None => format!("{COMMUNITY_BASE_ROUTE}/{community_id}/{slug}"),
    }
}

/// `/discussion/{id}/{slug}`
pub fn route_to_discussion(discussion_id: i64, slug: &str) -> String {
    format!("{DISCUSSION_BASE_ROUTE}/{discussion_id}/{slug}")
}

/// Lowercase, ASCII alphanumerics separated by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Route parameters of the current location.
///
/// Values are kept as the raw strings found in the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    /// `communityId` segment
    pub community_id: Option<String>,
    /// `communitySlug` segment
    pub community_slug: Option<String>,
    /// Tab segment after the community slug
    pub community_tab: Option<String>,
    /// `discussionId` segment
    pub discussion_id: Option<String>,
}

impl RouteParams {
    /// Parameters of a community URL.
    pub fn community(community_id: impl Into<String>, slug: Option<&str>) -> Self {
        Self {
            community_id: Some(community_id.into()),
            community_slug: slug.map(str::to_string),
            community_tab: None,
            discussion_id: None,
        }
    }

    /// Parse `/community/{id}[/{slug}[/{tab}]]` or `/discussion/{id}[/...]`.
    pub fn parse(path: &str) -> Self {
        let mut segments = path.trim_matches('/').split('/').filter(|s| !s.is_empty());
        let mut params = Self::default();
        match segments.next() {
            Some("community") => {
                params.community_id = segments.next().map(str::to_string);
                params.community_slug = segments.next().map(str::to_string);
                params.community_tab = segments.next().map(str::to_string);
            }
            Some("discussion") => {
                params.discussion_id = segments.next().map(str::to_string);
            }
            _ => {}
        }
        params
    }

    /// The community id, if present and numeric.
    pub fn community_id(&self) -> Option<i64> {
        self.community_id.as_deref().and_then(|id| id.parse().ok())
    }

    /// The discussion id, if present and numeric.
    pub fn discussion_id(&self) -> Option<i64> {
        self.discussion_id.as_deref().and_then(|id| id.parse().ok())
    }
}

/// A recorded navigation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// `push(path)`
    Push(String),
    /// `go_back()`
    Back,
    /// `replace(path)`
    Replace(String),
}

/// In-memory history used by the demo binary and tests.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
    events: Mutex<Vec<NavigationEvent>>,
}

impl MemoryNavigator {
    /// Start at `path`.
    pub fn at(path: &str) -> Self {
        Self {
            history: Mutex::new(vec![path.to_string()]),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Current location.
    pub fn location(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }

    /// Route parameters of the current location.
    pub fn params(&self) -> RouteParams {
        self.location()
            .map(|path| RouteParams::parse(&path))
            .unwrap_or_default()
    }

    /// Every navigation call, in order.
    pub fn events(&self) -> Vec<NavigationEvent> {
        self.events.lock().clone()
    }

    /// Only the `replace` calls.
    pub fn replacements(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                NavigationEvent::Replace(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Navigator for MemoryNavigator {
    fn push(&self, path: &str) {
        self.history.lock().push(path.to_string());
        self.events.lock().push(NavigationEvent::Push(path.to_string()));
    }

    fn go_back(&self) {
        let mut history = self.history.lock();
        if history.len() > 1 {
            history.pop();
        }
        self.events.lock().push(NavigationEvent::Back);
    }

    fn replace(&self, path: &str) {
        {
            let mut history = self.history.lock();
            history.pop();
            history.push(path.to_string());
        }
        self.events.lock().push(NavigationEvent::Replace(path.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert_eq!(route_to_community(7, "hiking-club", None), "/community/7/hiking-club");
        assert_eq!(
            route_to_community(42, "berlin", Some(CommunityTab::Discussions)),
            "/community/42/berlin/discussions"
        );
        assert_eq!(route_to_discussion(5, "welcome"), "/discussion/5/welcome");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hiking Club!"), "hiking-club");
        assert_eq!(slugify("  Where to eat -- late?  "), "where-to-eat-late");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_parse_params() {
        let params = RouteParams::parse("/community/7");
        assert_eq!(params.community_id(), Some(7));
        assert_eq!(params.community_slug, None);

        let params = RouteParams::parse("/community/7/hiking-club/discussions");
        assert_eq!(params.community_slug.as_deref(), Some("hiking-club"));
        assert_eq!(params.community_tab.as_deref(), Some("discussions"));

        let params = RouteParams::parse("/discussion/5/welcome");
        assert_eq!(params.discussion_id(), Some(5));
        assert_eq!(params.community_id, None);

        assert_eq!(RouteParams::parse("/community/abc").community_id(), None);
    }

    #[test]
    fn test_memory_navigator() {
        let navigator = MemoryNavigator::at("/community/7");
        navigator.replace("/community/7/hiking-club");
        assert_eq!(navigator.location().as_deref(), Some("/community/7/hiking-club"));

        navigator.push("/discussion/1/hello");
        navigator.go_back();
        assert_eq!(navigator.location().as_deref(), Some("/community/7/hiking-club"));
        assert_eq!(navigator.replacements(), vec!["/community/7/hiking-club"]);
        assert_eq!(navigator.events().len(), 3);
    }
}
