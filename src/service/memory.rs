//! In-memory service.
//!
//! A deterministic implementation of every service trait. Lists are paged
//! with offset tokens (`"20"`, `"40"`, ...). Each call is counted per method,
//! and failures can be queued per method. A gate can hold requests in flight
//! until it is released.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use super::{
    Article, ArticleKind, CommunitiesApi, Community, Discussion, DiscussionsApi, Event, EventsApi,
    Group, Reply, ThreadsApi, User, UserId, UsersApi,
};
use crate::error::{Error, Result};
use crate::navigation::slugify;
use crate::query::Page;
use crate::time::now_timestamp;

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Status reported for malformed page tokens
const INVALID_ARGUMENT: i32 = 3;

#[derive(Default)]
struct MemoryState {
    communities: BTreeMap<i64, Community>,
    sub_communities: HashMap<i64, Vec<i64>>,
    groups: HashMap<i64, Vec<Group>>,
    articles: HashMap<i64, Vec<Article>>,
    discussions: HashMap<i64, Vec<i64>>,
    discussion_records: HashMap<i64, Discussion>,
    admins: HashMap<i64, Vec<UserId>>,
    members: HashMap<i64, Vec<UserId>>,
    nearby_users: HashMap<i64, Vec<UserId>>,
    events: HashMap<i64, Vec<Event>>,
    threads: HashMap<i64, Vec<Reply>>,
    users: HashMap<UserId, User>,
    next_id: i64,
}

impl MemoryState {
    fn community(&self, community_id: i64) -> Result<&Community> {
        self.communities
            .get(&community_id)
            .ok_or(Error::CommunityNotFound)
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn open_thread(&mut self, thread_id: i64) {
        self.threads.entry(thread_id).or_default();
    }
}

/// Service backed by process memory.
pub struct InMemoryService {
    state: RwLock<MemoryState>,
    page_size: usize,
    current_user: UserId,
    latency: Option<Duration>,
    calls: DashMap<&'static str, usize>,
    failures: Mutex<HashMap<&'static str, VecDeque<Error>>>,
    gate: watch::Sender<bool>,
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryService {
    /// Empty service with [`DEFAULT_PAGE_SIZE`] pages.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: RwLock::new(MemoryState {
                next_id: 1000,
                ..MemoryState::default()
            }),
            page_size: DEFAULT_PAGE_SIZE,
            current_user: 1,
            latency: None,
            calls: DashMap::new(),
            failures: Mutex::new(HashMap::new()),
            gate,
        }
    }

    /// Serve lists in pages of `page_size` items.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// User recorded as the creator of new discussions.
    pub fn with_current_user(mut self, user_id: UserId) -> Self {
        self.current_user = user_id;
        self
    }

    // ========================================================================
    // Call control
    // ========================================================================

    /// Number of calls made to `method` so far.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.get(method).map(|count| *count).unwrap_or(0)
    }

    /// Fail the next call to `method` with `error`. Queued errors are
    /// returned in order, one per call.
    pub fn fail_next(&self, method: &'static str, error: Error) {
        self.failures.lock().entry(method).or_default().push_back(error);
    }

    /// Hold every call until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let held calls continue.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    async fn begin(&self, method: &'static str) -> Result<()> {
        *self.calls.entry(method).or_insert(0) += 1;
        tracing::debug!(method, "Service call");

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut gate = self.gate.subscribe();
        // The sender is owned by `self`, so the channel outlives this wait.
        let _ = gate.wait_for(|open| *open).await;

        let failure = self
            .failures
            .lock()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn paginate<T: Clone>(&self, items: &[T], token: Option<String>) -> Result<Page<T>> {
        paginate(items, token.as_deref(), self.page_size)
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Add or replace a community.
    pub fn add_community(&self, community: Community) {
        self.state
            .write()
            .communities
            .insert(community.community_id, community);
    }

    /// Add `community` below `parent_id`.
    pub fn add_sub_community(&self, parent_id: i64, community: Community) {
        let mut state = self.state.write();
        state
            .sub_communities
            .entry(parent_id)
            .or_default()
            .push(community.community_id);
        state.communities.insert(community.community_id, community);
    }

    /// Add a group to a community.
    pub fn add_group(&self, community_id: i64, group: Group) {
        self.state
            .write()
            .groups
            .entry(community_id)
            .or_default()
            .push(group);
    }

    /// Add a place or guide to a community.
    pub fn add_article(&self, community_id: i64, article: Article) {
        self.state
            .write()
            .articles
            .entry(community_id)
            .or_default()
            .push(article);
    }

    /// Append a discussion to its owner community's list.
    pub fn add_discussion(&self, discussion: Discussion) {
        let mut state = self.state.write();
        state.open_thread(discussion.thread_id);
        state
            .discussions
            .entry(discussion.owner_community_id)
            .or_default()
            .push(discussion.discussion_id);
        state
            .discussion_records
            .insert(discussion.discussion_id, discussion);
    }

    /// Make `user_id` an admin of a community.
    pub fn add_admin(&self, community_id: i64, user_id: UserId) {
        self.state
            .write()
            .admins
            .entry(community_id)
            .or_default()
            .push(user_id);
    }

    /// Make `user_id` a member of a community.
    pub fn add_member(&self, community_id: i64, user_id: UserId) {
        self.state
            .write()
            .members
            .entry(community_id)
            .or_default()
            .push(user_id);
    }

    /// List `user_id` as living near a community.
    pub fn add_nearby_user(&self, community_id: i64, user_id: UserId) {
        self.state
            .write()
            .nearby_users
            .entry(community_id)
            .or_default()
            .push(user_id);
    }

    /// Add an event to a community.
    pub fn add_event(&self, community_id: i64, event: Event) {
        self.state
            .write()
            .events
            .entry(community_id)
            .or_default()
            .push(event);
    }

    /// Append a reply to `thread_id`. The reply's own thread is opened too.
    pub fn add_reply(&self, thread_id: i64, reply: Reply) {
        let mut state = self.state.write();
        state.open_thread(reply.thread_id);
        state.threads.entry(thread_id).or_default().push(reply);
    }

    /// Add or replace a user.
    pub fn add_user(&self, user: User) {
        self.state.write().users.insert(user.user_id, user);
    }

    /// A small seeded community used by the demo binary.
    pub fn demo() -> Self {
        let service = Self::new().with_current_user(1);
        let created = 1_609_848_000;

        for (user_id, username, name) in [
            (1, "ana", "Ana Costa"),
            (2, "ben", "Ben Okafor"),
            (3, "chloe", "Chloé Martin"),
        ] {
            service.add_user(User {
                user_id,
                username: username.into(),
                name: name.into(),
                avatar_url: Some(format!("https://avatars.example/{username}.png")),
                city: "Lisbon".into(),
            });
        }

        service.add_community(Community {
            community_id: 7,
            name: "Hiking Club".into(),
            slug: "hiking-club".into(),
            description: "Weekend hikes around Lisbon.".into(),
            member_count: 3,
            admin_count: 1,
            created,
        });
        service.add_admin(7, 1);
        for user_id in 1..=3 {
            service.add_member(7, user_id);
        }

        for n in 0..25 {
            let discussion_id = 100 + n;
            let title = format!("Trail report #{}", n + 1);
            service.add_discussion(Discussion {
                discussion_id,
                thread_id: 500 + n,
                slug: slugify(&title),
                title,
                content: format!("Notes from hike number {}.", n + 1),
                creator_user_id: 1 + n % 3,
                owner_community_id: 7,
                created: created + n * 86_400,
            });
        }

        service.add_reply(
            500,
            Reply {
                thread_id: 900,
                content: "Great route, the views were worth it.".into(),
                author_user_id: 2,
                created_time: created + 3_600,
                num_replies: 1,
            },
        );
        service.add_reply(
            900,
            Reply {
                thread_id: 901,
                content: "Agreed! Going again next month.".into(),
                author_user_id: 3,
                created_time: created + 7_200,
                num_replies: 0,
            },
        );
        service
    }
}

/// Slice `items` at the offset named by `token`.
fn paginate<T: Clone>(items: &[T], token: Option<&str>, page_size: usize) -> Result<Page<T>> {
    let offset = match token {
        None | Some("") => 0,
        Some(token) => token.parse::<usize>().map_err(|_| Error::Server {
            status: INVALID_ARGUMENT,
            message: format!("Invalid page token: {token}"),
        })?,
    };

    let start = offset.min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    let page = items[start..end].to_vec();
    if end < items.len() {
        Ok(Page::new(page, end.to_string()))
    } else {
        Ok(Page::last(page))
    }
}

#[async_trait]
impl CommunitiesApi for InMemoryService {
    async fn get_community(&self, community_id: i64) -> Result<Community> {
        self.begin("get_community").await?;
        self.state.read().community(community_id).cloned()
    }

    async fn list_communities(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<Community>> {
        self.begin("list_communities").await?;
        let state = self.state.read();
        let communities: Vec<Community> = if community_id == 0 {
            state.communities.values().cloned().collect()
        } else {
            state.community(community_id)?;
            state
                .sub_communities
                .get(&community_id)
                .into_iter()
                .flatten()
                .filter_map(|id| state.communities.get(id).cloned())
                .collect()
        };
        self.paginate(&communities, page_token)
    }

    async fn list_groups(&self, community_id: i64, page_token: Option<String>) -> Result<Page<Group>> {
        self.begin("list_groups").await?;
        let state = self.state.read();
        state.community(community_id)?;
        let groups = state.groups.get(&community_id).map(Vec::as_slice).unwrap_or(&[]);
        self.paginate(groups, page_token)
    }

    async fn list_places(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<Article>> {
        self.begin("list_places").await?;
        let places = self.articles_of(community_id, ArticleKind::Place)?;
        self.paginate(&places, page_token)
    }

    async fn list_guides(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<Article>> {
        self.begin("list_guides").await?;
        let guides = self.articles_of(community_id, ArticleKind::Guide)?;
        self.paginate(&guides, page_token)
    }

    async fn list_discussions(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<Discussion>> {
        self.begin("list_discussions").await?;
        let state = self.state.read();
        state.community(community_id)?;
        let discussions: Vec<Discussion> = state
            .discussions
            .get(&community_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.discussion_records.get(id).cloned())
            .collect();
        self.paginate(&discussions, page_token)
    }

    async fn list_admins(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<UserId>> {
        self.begin("list_admins").await?;
        let state = self.state.read();
        state.community(community_id)?;
        let admins = state.admins.get(&community_id).map(Vec::as_slice).unwrap_or(&[]);
        self.paginate(admins, page_token)
    }

    async fn list_members(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<UserId>> {
        self.begin("list_members").await?;
        let state = self.state.read();
        state.community(community_id)?;
        let members = state.members.get(&community_id).map(Vec::as_slice).unwrap_or(&[]);
        self.paginate(members, page_token)
    }

    async fn list_nearby_users(
        &self,
        community_id: i64,
        page_token: Option<String>,
    ) -> Result<Page<UserId>> {
        self.begin("list_nearby_users").await?;
        let state = self.state.read();
        state.community(community_id)?;
        let nearby = state
            .nearby_users
            .get(&community_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.paginate(nearby, page_token)
    }
}

impl InMemoryService {
    fn articles_of(&self, community_id: i64, kind: ArticleKind) -> Result<Vec<Article>> {
        let state = self.state.read();
        state.community(community_id)?;
        Ok(state
            .articles
            .get(&community_id)
            .into_iter()
            .flatten()
            .filter(|article| article.kind == kind)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventsApi for InMemoryService {
    async fn list_community_events(
        &self,
        community_id: i64,
        page_token: Option<String>,
        page_size: Option<u32>,
    ) -> Result<Page<Event>> {
        self.begin("list_community_events").await?;
        let state = self.state.read();
        state.community(community_id)?;
        let events = state.events.get(&community_id).map(Vec::as_slice).unwrap_or(&[]);
        let page_size = page_size
            .map(|size| size.max(1) as usize)
            .unwrap_or(self.page_size);
        paginate(events, page_token.as_deref(), page_size)
    }
}

#[async_trait]
impl DiscussionsApi for InMemoryService {
    async fn create_discussion(
        &self,
        title: &str,
        content: &str,
        owner_community_id: i64,
    ) -> Result<Discussion> {
        self.begin("create_discussion").await?;

        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidDiscussion("title is required".into()));
        }

        let mut state = self.state.write();
        state.community(owner_community_id)?;

        let discussion_id = state.allocate_id();
        let thread_id = state.allocate_id();
        let discussion = Discussion {
            discussion_id,
            thread_id,
            slug: slugify(title),
            title: title.to_string(),
            content: content.to_string(),
            creator_user_id: self.current_user,
            owner_community_id,
            created: now_timestamp(),
        };

        state.open_thread(thread_id);
        state
            .discussions
            .entry(owner_community_id)
            .or_default()
            .insert(0, discussion_id);
        state
            .discussion_records
            .insert(discussion_id, discussion.clone());

        tracing::info!(discussion_id, owner_community_id, "Discussion created");
        Ok(discussion)
    }

    async fn get_discussion(&self, discussion_id: i64) -> Result<Discussion> {
        self.begin("get_discussion").await?;
        self.state
            .read()
            .discussion_records
            .get(&discussion_id)
            .cloned()
            .ok_or(Error::DiscussionNotFound)
    }
}

#[async_trait]
impl ThreadsApi for InMemoryService {
    async fn get_thread(&self, thread_id: i64, page_token: Option<String>) -> Result<Page<Reply>> {
        self.begin("get_thread").await?;
        let state = self.state.read();
        let replies = state.threads.get(&thread_id).ok_or(Error::ThreadNotFound)?;
        self.paginate(replies, page_token)
    }
}

#[async_trait]
impl UsersApi for InMemoryService {
    async fn get_users(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, User>> {
        self.begin("get_users").await?;
        let state = self.state.read();
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).map(|user| (*id, user.clone())))
            .collect())
    }
}
