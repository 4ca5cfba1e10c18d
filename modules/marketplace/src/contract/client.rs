use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::MarketError,
    model::{
        Account, Caller, LikeState, Listing, ListingFilter, ListingPatch, ListingView,
        MarketStats, NewListing, ProfilePatch, Role,
    },
};

/// The Bridge as seen by clients: every call carries the caller's identity and
/// is authorized on the serving side.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn get_role(&self, caller: &Caller) -> Result<Role, MarketError>;

    async fn get_profile(&self, caller: &Caller) -> Result<Account, MarketError>;

    async fn update_profile(
        &self,
        caller: &Caller,
        patch: ProfilePatch,
    ) -> Result<Account, MarketError>;

    async fn create_listing(
        &self,
        caller: &Caller,
        new_listing: NewListing,
    ) -> Result<Listing, MarketError>;

    /// Caller's own listings (any status), newest first.
    async fn get_own_listings(&self, caller: &Caller) -> Result<Vec<Listing>, MarketError>;

    /// Active listings matching `filter`, newest first.
    async fn get_all_listings(
        &self,
        caller: &Caller,
        filter: ListingFilter,
    ) -> Result<Vec<ListingView>, MarketError>;

    async fn update_listing(
        &self,
        caller: &Caller,
        listing_id: Uuid,
        patch: ListingPatch,
    ) -> Result<Listing, MarketError>;

    async fn delete_listing(&self, caller: &Caller, listing_id: Uuid) -> Result<(), MarketError>;

    async fn record_view(&self, caller: &Caller, listing_id: Uuid) -> Result<Listing, MarketError>;

    async fn update_user_role(
        &self,
        caller: &Caller,
        user_id: Uuid,
        role: Role,
    ) -> Result<Account, MarketError>;

    async fn delete_user(&self, caller: &Caller, user_id: Uuid) -> Result<(), MarketError>;

    async fn list_users(&self, caller: &Caller) -> Result<Vec<Account>, MarketError>;

    async fn toggle_like(&self, caller: &Caller, listing_id: Uuid)
        -> Result<LikeState, MarketError>;

    async fn get_likes(&self, caller: &Caller) -> Result<Vec<Uuid>, MarketError>;

    async fn get_like_count(&self, caller: &Caller, listing_id: Uuid) -> Result<u64, MarketError>;

    async fn get_stats(&self, caller: &Caller) -> Result<MarketStats, MarketError>;
}
