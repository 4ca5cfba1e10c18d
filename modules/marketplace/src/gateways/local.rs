use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::rest::error::from_domain;
use crate::contract::{
    client::MarketplaceApi,
    error::MarketError,
    model::{
        Account, Caller, LikeState, Listing, ListingFilter, ListingPatch, ListingView,
        MarketStats, NewListing, ProfilePatch, Role,
    },
};
use crate::domain::service::Service;

/// In-process implementation of [`MarketplaceApi`] that calls the Bridge
/// service directly.
#[derive(Clone)]
pub struct LocalMarketplaceClient {
    service: Arc<Service>,
}

impl LocalMarketplaceClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MarketplaceApi for LocalMarketplaceClient {
    async fn get_role(&self, caller: &Caller) -> Result<Role, MarketError> {
        self.service.get_role(caller).await.map_err(from_domain)
    }

    async fn get_profile(&self, caller: &Caller) -> Result<Account, MarketError> {
        self.service.get_profile(caller).await.map_err(from_domain)
    }

    async fn update_profile(
        &self,
        caller: &Caller,
        patch: ProfilePatch,
    ) -> Result<Account, MarketError> {
        self.service
            .update_profile(caller, patch)
            .await
            .map_err(from_domain)
    }

    async fn create_listing(
        &self,
        caller: &Caller,
        new_listing: NewListing,
    ) -> Result<Listing, MarketError> {
        self.service
            .create_listing(caller, new_listing)
            .await
            .map_err(from_domain)
    }

    async fn get_own_listings(&self, caller: &Caller) -> Result<Vec<Listing>, MarketError> {
        self.service
            .get_own_listings(caller)
            .await
            .map_err(from_domain)
    }

    async fn get_all_listings(
        &self,
        caller: &Caller,
        filter: ListingFilter,
    ) -> Result<Vec<ListingView>, MarketError> {
        self.service
            .get_all_listings(caller, filter)
            .await
            .map_err(from_domain)
    }

    async fn update_listing(
        &self,
        caller: &Caller,
        listing_id: Uuid,
        patch: ListingPatch,
    ) -> Result<Listing, MarketError> {
        self.service
            .update_listing(caller, listing_id, patch)
            .await
            .map_err(from_domain)
    }

    async fn delete_listing(&self, caller: &Caller, listing_id: Uuid) -> Result<(), MarketError> {
        self.service
            .delete_listing(caller, listing_id)
            .await
            .map_err(from_domain)
    }

    async fn record_view(&self, caller: &Caller, listing_id: Uuid) -> Result<Listing, MarketError> {
        self.service
            .record_view(caller, listing_id)
            .await
            .map_err(from_domain)
    }

    async fn update_user_role(
        &self,
        caller: &Caller,
        user_id: Uuid,
        role: Role,
    ) -> Result<Account, MarketError> {
        self.service
            .update_user_role(caller, user_id, role)
            .await
            .map_err(from_domain)
    }

    async fn delete_user(&self, caller: &Caller, user_id: Uuid) -> Result<(), MarketError> {
        self.service
            .delete_user(caller, user_id)
            .await
            .map_err(from_domain)
    }

    async fn list_users(&self, caller: &Caller) -> Result<Vec<Account>, MarketError> {
        self.service.list_users(caller).await.map_err(from_domain)
    }

    async fn toggle_like(
        &self,
        caller: &Caller,
        listing_id: Uuid,
    ) -> Result<LikeState, MarketError> {
        self.service
            .toggle_like(caller, listing_id)
            .await
            .map_err(from_domain)
    }

    async fn get_likes(&self, caller: &Caller) -> Result<Vec<Uuid>, MarketError> {
        self.service.get_likes(caller).await.map_err(from_domain)
    }

    async fn get_like_count(&self, caller: &Caller, listing_id: Uuid) -> Result<u64, MarketError> {
        self.service
            .get_like_count(caller, listing_id)
            .await
            .map_err(from_domain)
    }

    async fn get_stats(&self, caller: &Caller) -> Result<MarketStats, MarketError> {
        self.service.get_stats(caller).await.map_err(from_domain)
    }
}
