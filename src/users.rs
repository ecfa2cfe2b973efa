//! Batched user lookup.
//!
//! Avatars and names are resolved through one `get_users` call per distinct
//! id set. The id set is normalized by [`QueryKey::users`], so `[5, 2]` and
//! `[2, 5, 5]` share a cache entry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::query::{Qualifier, Query, QueryCache, QueryKey, QuerySnapshot};
use crate::service::{Service, User, UserId, UsersApi};

/// Resolved users by id
pub type UserMap = HashMap<UserId, User>;

/// Issues user lookups against the shared cache.
#[derive(Clone)]
pub struct UserLookup {
    cache: QueryCache,
    api: Arc<dyn UsersApi>,
}

impl UserLookup {
    /// Lookups through `service.users`.
    pub fn new(cache: QueryCache, service: &Service) -> Self {
        Self {
            cache,
            api: Arc::clone(&service.users),
        }
    }

    /// Look up `ids`. Disabled when `ids` is empty or `enabled` is false.
    pub fn users(&self, ids: &[UserId], enabled: bool) -> Result<UsersQuery> {
        let key = QueryKey::users(ids);
        let ids: Vec<UserId> = match key.qualifier() {
            Some(Qualifier::Users(ids)) => ids.clone(),
            _ => Vec::new(),
        };
        let enabled = enabled && !ids.is_empty();

        let api = Arc::clone(&self.api);
        let request = ids.clone();
        let query = self.cache.query(key, enabled, move || {
            let api = Arc::clone(&api);
            let request = request.clone();
            async move { api.get_users(&request).await }
        })?;

        Ok(UsersQuery { ids, query })
    }

    /// Look up a single user once its id is known.
    pub fn user(&self, id: Option<UserId>) -> Result<UsersQuery> {
        match id {
            Some(id) => self.users(&[id], true),
            None => self.users(&[], false),
        }
    }
}

/// Handle on a batched user lookup.
pub struct UsersQuery {
    ids: Vec<UserId>,
    query: Query<UserMap>,
}

impl UsersQuery {
    /// Requested ids, sorted and de-duplicated
    pub fn ids(&self) -> &[UserId] {
        &self.ids
    }

    /// Whether the lookup may fetch
    pub fn is_enabled(&self) -> bool {
        self.query.is_enabled()
    }

    /// Current state of the lookup.
    pub fn snapshot(&self) -> QuerySnapshot<UserMap> {
        self.query.snapshot()
    }

    /// The lookup is in flight and nothing is loaded yet.
    pub fn is_loading(&self) -> bool {
        self.query.snapshot().is_loading()
    }

    /// A resolved user, if loaded and known to the service.
    pub fn get(&self, id: UserId) -> Option<User> {
        self.query
            .snapshot()
            .data
            .and_then(|mut users| users.remove(&id))
    }

    /// Resolved users in id order. Unknown ids are skipped.
    pub fn resolved(&self) -> Vec<User> {
        let Some(users) = self.query.snapshot().data else {
            return Vec::new();
        };
        self.ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect()
    }

    /// Wait until the lookup settles.
    pub async fn settled(&mut self) -> QuerySnapshot<UserMap> {
        self.query.settled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::service::InMemoryService;

    fn lookup() -> (Arc<InMemoryService>, UserLookup) {
        let backend = Arc::new(InMemoryService::demo());
        let service = Service::from_backend(Arc::clone(&backend));
        let cache = QueryCache::new(QueryConfig::default().without_eviction());
        (backend, UserLookup::new(cache, &service))
    }

    #[tokio::test]
    async fn test_batched_lookup_shares_normalized_key() {
        let (backend, lookup) = lookup();

        let mut first = lookup.users(&[3, 1, 3], true).unwrap();
        assert!(first.is_loading());
        first.settled().await;
        assert_eq!(first.ids(), &[1, 3]);
        assert_eq!(first.get(3).map(|u| u.username), Some("chloe".to_string()));

        let second = lookup.users(&[1, 3], true).unwrap();
        assert_eq!(second.resolved().len(), 2);
        assert_eq!(backend.calls("get_users"), 1);
    }

    #[tokio::test]
    async fn test_empty_lookup_is_disabled() {
        let (backend, lookup) = lookup();
        let query = lookup.user(None).unwrap();
        assert!(!query.is_enabled());
        assert!(!query.is_loading());
        assert!(query.snapshot().is_idle());
        assert_eq!(backend.calls("get_users"), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_absent() {
        let (_, lookup) = lookup();
        let mut query = lookup.user(Some(404)).unwrap();
        query.settled().await;
        assert_eq!(query.get(404), None);
        assert!(query.resolved().is_empty());
    }
}
