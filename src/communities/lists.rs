//! Paginated community lists.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::query::{page_fetcher, InfiniteQuery, Page, QueryItem, QueryKey, QueryType};
use crate::service::{Article, Community, Event, Group, UserId};

/// Scope of the sub-communities query that lists every community
const ALL_COMMUNITIES: i64 = 0;

impl super::CommunityQueries {
    pub(super) fn list<T, F, Fut>(
        &self,
        key: QueryKey,
        enabled: bool,
        fetch: F,
    ) -> Result<InfiniteQuery<T>>
    where
        T: QueryItem,
        F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>>> + Send + 'static,
    {
        self.cache.infinite(key, page_fetcher(fetch), enabled)
    }

    // ── Sub-communities ─────────────────────────────────────────────────

    /// Communities below `community_id`. `Some(0)` lists every community;
    /// `None` is disabled.
    pub fn list_sub_communities(
        &self,
        community_id: Option<i64>,
    ) -> Result<InfiniteQuery<Community>> {
        let scope = community_id.unwrap_or(ALL_COMMUNITIES);
        let api = Arc::clone(&self.service.communities);
        self.list(
            QueryKey::sub_communities(scope),
            community_id.is_some(),
            move |token| {
                let api = Arc::clone(&api);
                async move { api.list_communities(scope, token).await }
            },
        )
    }

    // ── Community content ───────────────────────────────────────────────

    /// Groups of a community
    pub fn list_groups(&self, community_id: Option<i64>) -> Result<InfiniteQuery<Group>> {
        let id = community_id.unwrap_or_default();
        let api = Arc::clone(&self.service.communities);
        self.list(QueryKey::community_groups(id), id != 0, move |token| {
            let api = Arc::clone(&api);
            async move { api.list_groups(id, token).await }
        })
    }

    /// Places of a community
    pub fn list_places(&self, community_id: Option<i64>) -> Result<InfiniteQuery<Article>> {
        let id = community_id.unwrap_or_default();
        let api = Arc::clone(&self.service.communities);
        self.list(QueryKey::community_places(id), id != 0, move |token| {
            let api = Arc::clone(&api);
            async move { api.list_places(id, token).await }
        })
    }

    /// Guides of a community
    pub fn list_guides(&self, community_id: Option<i64>) -> Result<InfiniteQuery<Article>> {
        let id = community_id.unwrap_or_default();
        let api = Arc::clone(&self.service.communities);
        self.list(QueryKey::community_guides(id), id != 0, move |token| {
            let api = Arc::clone(&api);
            async move { api.list_guides(id, token).await }
        })
    }

    /// Events of a community. Always enabled.
    ///
    /// `page_size` falls back to the configured events page size, then to
    /// the service default.
    pub fn list_community_events(
        &self,
        community_id: i64,
        page_size: Option<u32>,
        query_type: QueryType,
    ) -> Result<InfiniteQuery<Event>> {
        let page_size = page_size.or(self.cache.config().events_page_size);
        let api = Arc::clone(&self.service.events);
        self.list(
            QueryKey::community_events(community_id, query_type),
            true,
            move |token| {
                let api = Arc::clone(&api);
                async move { api.list_community_events(community_id, token, page_size).await }
            },
        )
    }

    // ── People ──────────────────────────────────────────────────────────

    /// Member ids of a community
    pub fn list_members(&self, community_id: Option<i64>) -> Result<InfiniteQuery<UserId>> {
        let id = community_id.unwrap_or_default();
        let api = Arc::clone(&self.service.communities);
        self.list(QueryKey::community_members(id), id != 0, move |token| {
            let api = Arc::clone(&api);
            async move { api.list_members(id, token).await }
        })
    }

    /// Ids of users near a community
    pub fn list_nearby_users(&self, community_id: Option<i64>) -> Result<InfiniteQuery<UserId>> {
        let id = community_id.unwrap_or_default();
        let api = Arc::clone(&self.service.communities);
        self.list(QueryKey::community_nearby_users(id), id != 0, move |token| {
            let api = Arc::clone(&api);
            async move { api.list_nearby_users(id, token).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::CommunityQueries;
    use super::*;
    use crate::config::QueryConfig;
    use crate::query::QueryCache;
    use crate::service::{ArticleKind, InMemoryService, Service};

    fn setup() -> (Arc<InMemoryService>, CommunityQueries) {
        let backend = Arc::new(InMemoryService::demo().with_page_size(2));
        backend.add_article(
            7,
            Article {
                page_id: 1,
                kind: ArticleKind::Place,
                title: "Sintra".into(),
                slug: "sintra".into(),
                content: String::new(),
                last_edited: 0,
            },
        );
        backend.add_article(
            7,
            Article {
                page_id: 2,
                kind: ArticleKind::Guide,
                title: "Packing list".into(),
                slug: "packing-list".into(),
                content: String::new(),
                last_edited: 0,
            },
        );
        let cache = QueryCache::new(QueryConfig::default().without_eviction());
        let queries = CommunityQueries::new(cache, Service::from_backend(Arc::clone(&backend)));
        (backend, queries)
    }

    #[tokio::test]
    async fn test_missing_community_id_disables_lists() {
        let (backend, queries) = setup();

        assert!(queries.list_groups(None).unwrap().snapshot().is_idle());
        assert!(queries.list_places(Some(0)).unwrap().snapshot().is_idle());
        assert!(queries.list_guides(None).unwrap().snapshot().is_idle());
        assert!(queries.list_members(None).unwrap().snapshot().is_idle());
        assert!(queries.list_nearby_users(None).unwrap().snapshot().is_idle());
        assert!(queries.list_sub_communities(None).unwrap().snapshot().is_idle());

        assert_eq!(backend.calls("list_groups"), 0);
        assert_eq!(backend.calls("list_communities"), 0);
    }

    #[tokio::test]
    async fn test_zero_lists_all_communities() {
        let (backend, queries) = setup();
        let mut all = queries.list_sub_communities(Some(0)).unwrap();
        assert!(all.is_enabled());
        let snapshot = all.settled().await;
        assert_eq!(snapshot.item_count(), 1);
        assert_eq!(all.key(), &QueryKey::sub_communities(0));
        assert_eq!(backend.calls("list_communities"), 1);
    }

    #[tokio::test]
    async fn test_members_paginate() {
        let (_, queries) = setup();
        let mut members = queries.list_members(Some(7)).unwrap();

        let first = members.settled().await;
        assert_eq!(first.to_items(), vec![1, 2]);
        assert!(first.has_next_page);

        assert!(members.fetch_next_page());
        let second = members.settled().await;
        assert_eq!(second.to_items(), vec![1, 2, 3]);
        assert!(!second.has_next_page);
        assert!(!members.fetch_next_page());
    }

    #[tokio::test]
    async fn test_places_and_guides_are_separate() {
        let (_, queries) = setup();
        let mut places = queries.list_places(Some(7)).unwrap();
        let mut guides = queries.list_guides(Some(7)).unwrap();

        let places = places.settled().await;
        let guides = guides.settled().await;
        assert_eq!(places.items().next().map(|a| a.slug.as_str()), Some("sintra"));
        assert_eq!(guides.items().next().map(|a| a.slug.as_str()), Some("packing-list"));
    }

    #[tokio::test]
    async fn test_events_always_enabled() {
        let (backend, queries) = setup();
        let mut events = queries
            .list_community_events(7, Some(10), QueryType::Summary)
            .unwrap();
        let snapshot = events.settled().await;
        assert!(!snapshot.has_items());
        assert_eq!(snapshot.status, crate::query::QueryStatus::Success);

        // Unknown community: the service reports the failure.
        let mut missing = queries
            .list_community_events(404, None, QueryType::All)
            .unwrap();
        let snapshot = missing.settled().await;
        assert!(snapshot.error.is_some());
        assert_eq!(backend.calls("list_community_events"), 2);
    }
}
