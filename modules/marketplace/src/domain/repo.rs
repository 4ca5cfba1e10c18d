use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{
    Account, GlobalStats, Listing, ListingFilter, ListingView, Role, UserStats,
};

/// Restricts a listing write to a given owner. Admin writes use `Any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerGuard {
    Any,
    Owner(Uuid),
}

impl OwnerGuard {
    pub fn permits(&self, owner_id: Uuid) -> bool {
        match self {
            OwnerGuard::Any => true,
            OwnerGuard::Owner(id) => *id == owner_id,
        }
    }
}

/// Persistence port for the Profile Registry.
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>>;

    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Account>>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;

    /// Insert unless an account with the same external id exists; never fails
    /// on that conflict. Returns true when this call created the row.
    async fn insert_if_absent(&self, account: Account) -> anyhow::Result<bool>;

    async fn update_names(
        &self,
        id: Uuid,
        first_name: Option<Option<String>>,
        last_name: Option<Option<String>>,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Account>>;

    async fn set_role(&self, id: Uuid, role: Role, at: DateTime<Utc>)
        -> anyhow::Result<Option<Account>>;

    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<Account>>;

    /// Removes the account with its likes and listings in one transaction.
    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Persistence port for the Listing Store.
#[async_trait]
pub trait ListingsRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Listing>>;

    async fn insert(&self, listing: Listing) -> anyhow::Result<()>;

    /// Newest first, any status.
    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Listing>>;

    /// Active listings matching a `ListingFilter::normalized` filter, newest
    /// first, with seller names.
    async fn list_active(&self, filter: &ListingFilter) -> anyhow::Result<Vec<ListingView>>;

    /// Writes every mutable column of `listing`. Returns false when no row
    /// matched the id and the guard.
    async fn update(&self, listing: Listing, guard: OwnerGuard) -> anyhow::Result<bool>;

    /// Deletes the listing with its likes. Returns false when no row matched.
    async fn delete(&self, id: Uuid, guard: OwnerGuard) -> anyhow::Result<bool>;

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<Listing>>;

    async fn global_stats(&self) -> anyhow::Result<GlobalStats>;

    async fn user_stats(&self, account_id: Uuid) -> anyhow::Result<UserStats>;
}

/// Persistence port for bookmarks.
#[async_trait]
pub trait LikesRepository: Send + Sync {
    /// Flips the like atomically; returns the new state and like count.
    async fn toggle(&self, account_id: Uuid, listing_id: Uuid) -> anyhow::Result<(bool, u64)>;

    async fn count_for_listing(&self, listing_id: Uuid) -> anyhow::Result<u64>;

    async fn liked_listing_ids(&self, account_id: Uuid) -> anyhow::Result<Vec<Uuid>>;
}
