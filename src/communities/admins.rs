//! Community admins with their user records.

use std::sync::Arc;

use crate::error::Result;
use crate::query::{InfiniteQuery, InfiniteSnapshot, QueryKey, QueryType};
use crate::service::{User, UserId};
use crate::users::{UserLookup, UsersQuery};

/// Admin ids of a community, resolved to users.
///
/// The user lookup follows the admin id set: once more admin pages load,
/// [`refresh_users`](Self::refresh_users) re-keys the lookup.
pub struct AdminsQuery {
    admins: InfiniteQuery<UserId>,
    lookup: UserLookup,
    users: UsersQuery,
}

impl AdminsQuery {
    /// Admin id pages.
    pub fn snapshot(&self) -> InfiniteSnapshot<UserId> {
        self.admins.snapshot()
    }

    /// Admin ids across all loaded pages.
    pub fn admin_ids(&self) -> Vec<UserId> {
        self.admins.snapshot().to_items()
    }

    /// Resolved admin users, in id order.
    pub fn admin_users(&self) -> Vec<User> {
        self.users.resolved()
    }

    /// Either the admin ids or their users are still loading. Loaded ids
    /// the user lookup is not yet keyed to count as loading.
    pub fn is_loading(&self) -> bool {
        self.admins.snapshot().is_loading() || self.users.is_loading() || self.users_stale()
    }

    fn users_stale(&self) -> bool {
        let ids = self.admin_ids();
        !ids.is_empty() && QueryKey::users(&ids) != QueryKey::users(self.users.ids())
    }

    /// Whether the admin list may fetch
    pub fn is_enabled(&self) -> bool {
        self.admins.is_enabled()
    }

    /// Load the next page of admin ids.
    pub fn fetch_next_page(&self) -> bool {
        self.admins.fetch_next_page()
    }

    /// Point the user lookup at the current admin ids. Returns `true` if the
    /// id set changed.
    pub fn refresh_users(&mut self) -> Result<bool> {
        let ids = self.admin_ids();
        if QueryKey::users(&ids) == QueryKey::users(self.users.ids()) {
            return Ok(false);
        }
        self.users = self.lookup.users(&ids, true)?;
        Ok(true)
    }

    /// Wait for the admin ids, then for their users.
    pub async fn settled(&mut self) -> Result<InfiniteSnapshot<UserId>> {
        let snapshot = self.admins.settled().await;
        self.refresh_users()?;
        self.users.settled().await;
        Ok(snapshot)
    }
}

impl super::CommunityQueries {
    // ── Admins ──────────────────────────────────────────────────────────

    /// Admins of a community, per view. Disabled for a zero id.
    pub fn list_admins(&self, community_id: i64, query_type: QueryType) -> Result<AdminsQuery> {
        let api = Arc::clone(&self.service.communities);
        let admins = self.list(
            QueryKey::community_admins(community_id, query_type),
            community_id != 0,
            move |token| {
                let api = Arc::clone(&api);
                async move { api.list_admins(community_id, token).await }
            },
        )?;

        let ids = admins.snapshot().to_items();
        let users = self.users.users(&ids, true)?;
        Ok(AdminsQuery {
            admins,
            lookup: self.users.clone(),
            users,
        })
    }
}
