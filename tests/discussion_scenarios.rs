//! End-to-end scenarios over the in-memory service.

use std::sync::Arc;

use gather_core::navigation::{MemoryNavigator, NavigationEvent, Navigator};
use gather_core::service::{Community, Discussion};
use gather_core::views::{
    find_button, Action, DiscussionPage, DiscussionsListPage, DiscussionsSection, Node,
    CREATOR_LOADING_TEST_ID, DISCUSSIONS_EMPTY_STATE, LOAD_MORE_DISCUSSIONS_LABEL,
    SEE_MORE_DISCUSSIONS_LABEL,
};
use gather_core::{
    CommunityQueries, Error, InMemoryService, QueryCache, QueryConfig, QueryKey, RouteParams,
    Service,
};

fn community(community_id: i64, slug: &str) -> Community {
    Community {
        community_id,
        name: slug.replace('-', " "),
        slug: slug.to_string(),
        description: String::new(),
        member_count: 0,
        admin_count: 0,
        created: 0,
    }
}

fn discussion(discussion_id: i64, owner_community_id: i64) -> Discussion {
    Discussion {
        discussion_id,
        thread_id: 10_000 + discussion_id,
        slug: format!("discussion-{discussion_id}"),
        title: format!("Discussion {discussion_id}"),
        content: "Body".to_string(),
        creator_user_id: 1,
        owner_community_id,
        created: 0,
    }
}

fn queries(backend: &Arc<InMemoryService>) -> CommunityQueries {
    let cache = QueryCache::new(QueryConfig::default().without_eviction());
    CommunityQueries::new(cache, Service::from_backend(Arc::clone(backend)))
}

fn cards(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::DiscussionCard { key, .. } => Some(key.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn see_more_disappears_once_every_page_is_loaded() {
    let backend = Arc::new(InMemoryService::new().with_page_size(20));
    backend.add_community(community(42, "berlin"));
    for id in 1..=35 {
        backend.add_discussion(discussion(id, 42));
    }
    let queries = queries(&backend);
    let navigator = MemoryNavigator::at("/community/42/berlin");

    let mut section = DiscussionsSection::new(&queries, community(42, "berlin")).unwrap();
    section.settled().await;
    let nodes = section.render();
    let keys = cards(&nodes);
    assert_eq!(keys.len(), 20);
    assert_eq!(keys[0], "discussioncard-10001");

    // "See more" leads to the full list, which shares the cache entry.
    let see_more = find_button(&nodes, SEE_MORE_DISCUSSIONS_LABEL).cloned().unwrap();
    assert!(see_more.navigate(&navigator));
    assert_eq!(
        navigator.location().as_deref(),
        Some("/community/42/berlin/discussions")
    );

    let mut list = DiscussionsListPage::new(&queries, 42).unwrap();
    assert_eq!(cards(&list.render()).len(), 20);
    assert!(list.perform(&Action::LoadMore, &navigator));
    list.settled().await;

    let keys = cards(&list.render());
    assert_eq!(keys.len(), 35);
    let expected: Vec<String> = (1..=35)
        .map(|id| format!("discussioncard-{}", 10_000 + id))
        .collect();
    assert_eq!(keys, expected);
    assert_eq!(find_button(&list.render(), LOAD_MORE_DISCUSSIONS_LABEL), None);

    // The section now sees the terminal page too.
    assert_eq!(find_button(&section.render(), SEE_MORE_DISCUSSIONS_LABEL), None);
    assert!(!section.discussions().fetch_next_page());
    assert_eq!(backend.calls("list_discussions"), 2);
}

#[tokio::test]
async fn empty_community_shows_empty_state() {
    let backend = Arc::new(InMemoryService::new());
    backend.add_community(community(8, "quiet-town"));
    let queries = queries(&backend);

    let mut section = DiscussionsSection::new(&queries, community(8, "quiet-town")).unwrap();
    section.settled().await;
    let nodes = section.render();

    assert!(cards(&nodes).is_empty());
    assert!(nodes.contains(&Node::Text {
        text: DISCUSSIONS_EMPTY_STATE.to_string()
    }));
    assert_eq!(find_button(&nodes, SEE_MORE_DISCUSSIONS_LABEL), None);
}

#[tokio::test]
async fn stale_url_is_replaced_with_canonical_slug_once() {
    let backend = Arc::new(InMemoryService::new());
    backend.add_community(community(7, "hiking-club"));
    let queries = queries(&backend);
    let navigator = MemoryNavigator::at("/community/7");

    let mut query = queries.community(None, &navigator.params()).unwrap();
    assert_eq!(query.query_community_id(), Some(7));
    assert_eq!(query.sync(&navigator.params(), &navigator), None);

    query.settled().await;
    assert_eq!(
        query.sync(&navigator.params(), &navigator).as_deref(),
        Some("/community/7/hiking-club")
    );

    // Re-rendering with the same data and the new location does nothing.
    for _ in 0..3 {
        assert_eq!(query.sync(&navigator.params(), &navigator), None);
    }
    assert_eq!(
        navigator.events(),
        vec![NavigationEvent::Replace("/community/7/hiking-club".into())]
    );

    // An explicit id never redirects.
    let mut explicit = queries
        .community(Some(7), &RouteParams::community("7", Some("old-slug")))
        .unwrap();
    explicit.settled().await;
    assert_eq!(
        explicit.sync(&RouteParams::community("7", Some("old-slug")), &navigator),
        None
    );
    assert_eq!(backend.calls("get_community"), 1);
}

#[tokio::test]
async fn failed_discussion_shows_banner_without_creator() {
    let backend = Arc::new(InMemoryService::demo());
    backend.add_discussion(discussion(5, 7));
    backend.fail_next("get_discussion", Error::Network("connection reset".into()));
    let queries = queries(&backend);

    let mut page = DiscussionPage::new(&queries, 5).unwrap();
    page.settled().await.unwrap();
    let nodes = page.render();

    assert!(matches!(&nodes[..], [Node::Alert { message }] if message.contains("connection reset")));
    assert!(!nodes.iter().any(|node| matches!(
        node,
        Node::Skeleton { test_id } if test_id == CREATOR_LOADING_TEST_ID
    )));
    assert_eq!(backend.calls("get_users"), 0);
}

#[tokio::test]
async fn concurrent_subscribers_share_one_fetch() {
    let backend = Arc::new(InMemoryService::demo());
    let queries = queries(&backend);
    backend.hold();

    let mut first = queries.discussion(100).unwrap();
    let mut second = queries.discussion(100).unwrap();
    assert!(first.snapshot().is_loading());
    assert!(second.snapshot().is_loading());
    assert_eq!(queries.cache().subscriber_count(&QueryKey::discussion(100)), 2);

    backend.release();
    let a = first.settled().await;
    let b = second.settled().await;
    assert_eq!(a.data, b.data);
    assert_eq!(backend.calls("get_discussion"), 1);
}

#[tokio::test]
async fn new_discussion_appears_in_open_section() {
    let backend = Arc::new(InMemoryService::demo());
    let queries = queries(&backend);
    let navigator = Arc::new(MemoryNavigator::at("/community/7/hiking-club"));

    let mut section = DiscussionsSection::new(&queries, community(7, "hiking-club")).unwrap();
    section.settled().await;

    let mutation = queries.new_discussion_mutation(Some(Box::new({
        let navigator = Arc::clone(&navigator);
        move || navigator.push("/community/7/hiking-club/discussions")
    })));
    let created = mutation
        .mutate(gather_core::communities::NewDiscussion {
            title: "Lost and found".into(),
            content: "Found a blue jacket at the trailhead.".into(),
            owner_community_id: 7,
        })
        .await
        .unwrap();

    section.settled().await;
    let keys = cards(&section.render());
    assert_eq!(keys[0], format!("discussioncard-{}", created.thread_id));
    assert_eq!(navigator.events().len(), 1);
}
