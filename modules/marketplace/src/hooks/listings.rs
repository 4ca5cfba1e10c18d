//! Cached listing collections kept in sync with the caller's own mutations.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::contract::{
    client::MarketplaceApi,
    error::MarketError,
    model::{Caller, Listing, ListingFilter, ListingPatch, ListingStatus, ListingView, NewListing},
};
use crate::hooks::policy::{CallPolicy, FetchState};

/// Which collection the hook mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// Active listings of everyone, narrowed by the current filter.
    All,
    /// Every listing the caller owns, sold ones included.
    Own,
}

#[derive(Default)]
struct Inner {
    fetch: FetchState<Vec<ListingView>>,
    filter: ListingFilter,
    // bumped by every load; a response only lands if it is still current
    generation: u64,
}

pub struct ListingsHook {
    api: Arc<dyn MarketplaceApi>,
    caller: Caller,
    scope: ListingScope,
    policy: CallPolicy,
    inner: RwLock<Inner>,
}

impl ListingsHook {
    pub fn new(api: Arc<dyn MarketplaceApi>, caller: Caller, scope: ListingScope) -> Self {
        Self {
            api,
            caller,
            scope,
            policy: CallPolicy::default(),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn scope(&self) -> ListingScope {
        self.scope
    }

    pub fn snapshot(&self) -> FetchState<Vec<ListingView>> {
        self.inner.read().fetch.clone()
    }

    pub fn filter(&self) -> ListingFilter {
        self.inner.read().filter.clone()
    }

    /// Fetch with the current filter.
    pub async fn load(&self) -> Result<(), MarketError> {
        let (generation, filter) = {
            let mut inner = self.inner.write();
            inner.generation += 1;
            inner.fetch.loading = true;
            (inner.generation, inner.filter.clone())
        };

        let (api, caller) = (&self.api, &self.caller);
        let result = match self.scope {
            ListingScope::All => {
                self.policy
                    .read(move || api.get_all_listings(caller, filter.clone()))
                    .await
            }
            ListingScope::Own => {
                let seller_name = caller.display_name();
                self.policy
                    .read(move || api.get_own_listings(caller))
                    .await
                    .map(|listings| {
                        listings
                            .into_iter()
                            .map(|listing| ListingView {
                                listing,
                                seller_name: seller_name.clone(),
                            })
                            .collect()
                    })
            }
        };

        let mut inner = self.inner.write();
        if inner.generation != generation {
            debug!(generation, "Dropping stale listings response");
            return Ok(());
        }
        inner.fetch.loading = false;
        match result {
            Ok(listings) => {
                inner.fetch.data = listings;
                inner.fetch.error = None;
                Ok(())
            }
            Err(e) => {
                inner.fetch.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Replace the filter and fetch again.
    pub async fn refetch(&self, filter: ListingFilter) -> Result<(), MarketError> {
        self.inner.write().filter = filter;
        self.load().await
    }

    pub async fn create(&self, new_listing: NewListing) -> Result<Listing, MarketError> {
        let listing = self
            .policy
            .mutate(self.api.create_listing(&self.caller, new_listing))
            .await?;

        let mut inner = self.inner.write();
        if self.visible(&inner.filter, &listing) {
            let view = ListingView {
                listing: listing.clone(),
                seller_name: self.caller.display_name(),
            };
            inner.fetch.data.insert(0, view);
        }
        Ok(listing)
    }

    pub async fn update(&self, listing_id: Uuid, patch: ListingPatch) -> Result<Listing, MarketError> {
        let listing = self
            .policy
            .mutate(self.api.update_listing(&self.caller, listing_id, patch))
            .await?;

        let mut inner = self.inner.write();
        let keep = self.visible(&inner.filter, &listing);
        let data = &mut inner.fetch.data;
        if let Some(pos) = data.iter().position(|v| v.listing.id == listing_id) {
            if keep {
                data[pos].listing = listing.clone();
            } else {
                data.remove(pos);
            }
        }
        Ok(listing)
    }

    pub async fn delete(&self, listing_id: Uuid) -> Result<(), MarketError> {
        self.policy
            .mutate(self.api.delete_listing(&self.caller, listing_id))
            .await?;
        self.inner
            .write()
            .fetch
            .data
            .retain(|v| v.listing.id != listing_id);
        Ok(())
    }

    fn visible(&self, filter: &ListingFilter, listing: &Listing) -> bool {
        match self.scope {
            ListingScope::Own => true,
            ListingScope::All => listing.status == ListingStatus::Active && filter.matches(listing),
        }
    }
}
