//! # Cache Keys
//!
//! Deterministic key construction per query shape. Two logically identical
//! queries always build equal keys, so they share one cache entry; the same
//! keys are used to invalidate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::service::UserId;

/// Which slice of a list a view asks for.
///
/// Summary views and full pages of the same list are cached separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// A short preview embedded in another page
    Summary,
    /// The dedicated full list
    All,
}

impl QueryType {
    /// Convert to the string representation used in keys
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Summary => "summary",
            QueryType::All => "all",
        }
    }
}

/// The resource family a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    /// A single community
    Community,
    /// Communities below a parent community
    SubCommunities,
    /// Groups of a community
    CommunityGroups,
    /// Places of a community
    CommunityPlaces,
    /// Guides of a community
    CommunityGuides,
    /// Discussions of a community
    CommunityDiscussions,
    /// Admin user ids of a community
    CommunityAdmins,
    /// Member user ids of a community
    CommunityMembers,
    /// Nearby user ids of a community
    CommunityNearbyUsers,
    /// Events of a community
    CommunityEvents,
    /// A single discussion
    Discussion,
    /// Replies of a thread
    Thread,
    /// A batch of users
    Users,
}

impl Resource {
    /// Name used when rendering keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Community => "community",
            Resource::SubCommunities => "subCommunities",
            Resource::CommunityGroups => "communityGroups",
            Resource::CommunityPlaces => "communityPlaces",
            Resource::CommunityGuides => "communityGuides",
            Resource::CommunityDiscussions => "communityDiscussions",
            Resource::CommunityAdmins => "communityAdmins",
            Resource::CommunityMembers => "communityMembers",
            Resource::CommunityNearbyUsers => "communityNearbyUsers",
            Resource::CommunityEvents => "communityEvents",
            Resource::Discussion => "discussion",
            Resource::Thread => "thread",
            Resource::Users => "users",
        }
    }
}

/// Extra discriminator beyond the scoping id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    /// Summary or full list
    View(QueryType),
    /// Sorted, de-duplicated user ids of a batched lookup
    Users(Vec<UserId>),
}

/// A structured cache key: (resource, scope id, qualifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    resource: Resource,
    scope: i64,
    qualifier: Option<Qualifier>,
}

impl QueryKey {
    /// Build a key from its parts.
    pub fn new(resource: Resource, scope: i64, qualifier: Option<Qualifier>) -> Self {
        Self {
            resource,
            scope,
            qualifier,
        }
    }

    /// Resource family
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Scoping id (community id, thread id, ...)
    pub fn scope(&self) -> i64 {
        self.scope
    }

    /// Qualifier, if any
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// Whether this key falls under `filter`.
    ///
    /// Resource and scope must be equal; a filter without a qualifier
    /// matches every qualifier.
    pub fn matches(&self, filter: &QueryKey) -> bool {
        self.resource == filter.resource
            && self.scope == filter.scope
            && (filter.qualifier.is_none() || self.qualifier == filter.qualifier)
    }

    // ── Registry ────────────────────────────────────────────────────────

    /// A community by id
    pub fn community(community_id: i64) -> Self {
        Self::new(Resource::Community, community_id, None)
    }

    /// Sub-communities of a community (0 lists top-level communities)
    pub fn sub_communities(community_id: i64) -> Self {
        Self::new(Resource::SubCommunities, community_id, None)
    }

    /// Groups of a community
    pub fn community_groups(community_id: i64) -> Self {
        Self::new(Resource::CommunityGroups, community_id, None)
    }

    /// Places of a community
    pub fn community_places(community_id: i64) -> Self {
        Self::new(Resource::CommunityPlaces, community_id, None)
    }

    /// Guides of a community
    pub fn community_guides(community_id: i64) -> Self {
        Self::new(Resource::CommunityGuides, community_id, None)
    }

    /// Discussions of a community
    pub fn community_discussions(community_id: i64) -> Self {
        Self::new(Resource::CommunityDiscussions, community_id, None)
    }

    /// Admins of a community, per view
    pub fn community_admins(community_id: i64, query_type: QueryType) -> Self {
        Self::new(
            Resource::CommunityAdmins,
            community_id,
            Some(Qualifier::View(query_type)),
        )
    }

    /// Members of a community
    pub fn community_members(community_id: i64) -> Self {
        Self::new(Resource::CommunityMembers, community_id, None)
    }

    /// Users near a community
    pub fn community_nearby_users(community_id: i64) -> Self {
        Self::new(Resource::CommunityNearbyUsers, community_id, None)
    }

    /// Events of a community, per view
    pub fn community_events(community_id: i64, query_type: QueryType) -> Self {
        Self::new(
            Resource::CommunityEvents,
            community_id,
            Some(Qualifier::View(query_type)),
        )
    }

    /// A discussion by id
    pub fn discussion(discussion_id: i64) -> Self {
        Self::new(Resource::Discussion, discussion_id, None)
    }

    /// Replies of a thread
    pub fn thread(thread_id: i64) -> Self {
        Self::new(Resource::Thread, thread_id, None)
    }

    /// A batch of users; order and duplicates in `ids` do not matter
    pub fn users(ids: &[UserId]) -> Self {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Self::new(Resource::Users, 0, Some(Qualifier::Users(ids)))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource.as_str(), self.scope)?;
        match &self.qualifier {
            Some(Qualifier::View(query_type)) => write!(f, "/{}", query_type.as_str()),
            Some(Qualifier::Users(ids)) => {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(f, "/[{}]", ids.join(","))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_queries_build_equal_keys() {
        assert_eq!(
            QueryKey::community_discussions(42),
            QueryKey::community_discussions(42)
        );
        assert_ne!(
            QueryKey::community_discussions(42),
            QueryKey::community_discussions(43)
        );
        assert_ne!(
            QueryKey::community_members(42),
            QueryKey::community_discussions(42)
        );
    }

    #[test]
    fn test_qualified_keys() {
        assert_ne!(
            QueryKey::community_admins(1, QueryType::Summary),
            QueryKey::community_admins(1, QueryType::All)
        );
        assert_eq!(
            QueryKey::community_events(1, QueryType::All).qualifier(),
            Some(&Qualifier::View(QueryType::All))
        );
    }

    #[test]
    fn test_users_key_ignores_order_and_duplicates() {
        assert_eq!(QueryKey::users(&[3, 1, 2, 1]), QueryKey::users(&[1, 2, 3]));
    }

    #[test]
    fn test_matches() {
        let summary = QueryKey::community_admins(7, QueryType::Summary);
        let all = QueryKey::community_admins(7, QueryType::All);
        let any_view = QueryKey::new(Resource::CommunityAdmins, 7, None);

        assert!(summary.matches(&any_view));
        assert!(all.matches(&any_view));
        assert!(summary.matches(&summary));
        assert!(!summary.matches(&all));
        assert!(!QueryKey::community_admins(8, QueryType::All).matches(&any_view));
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryKey::thread(9).to_string(), "thread/9");
        assert_eq!(
            QueryKey::community_events(4, QueryType::Summary).to_string(),
            "communityEvents/4/summary"
        );
        assert_eq!(QueryKey::users(&[5, 2]).to_string(), "users/0/[2,5]");
    }
}
