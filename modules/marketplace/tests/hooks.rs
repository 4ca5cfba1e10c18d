mod common;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use common::{create_test_client, member, new_listing};
use marketplace::{
    contract::{
        client::MarketplaceApi,
        error::MarketError,
        model::{
            Account, Caller, LikeState, Listing, ListingFilter, ListingPatch, ListingStatus,
            ListingView, MarketStats, NewListing, ProfilePatch, Role,
        },
    },
    hooks::{
        listing_contact_link, IdentityState, LikesHook, ListingScope, ListingsHook, SessionHook,
    },
};

/// Delegates to a real client but can be switched into a failing state.
struct Flaky {
    inner: Arc<dyn MarketplaceApi>,
    failing: AtomicBool,
    calls: AtomicU32,
}

impl Flaky {
    fn new(inner: Arc<dyn MarketplaceApi>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            failing: AtomicBool::new(false),
            calls: AtomicU32::new(0),
        })
    }

    fn fail(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
        self.calls.store(0, Ordering::SeqCst);
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn gate(&self) -> Result<(), MarketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(MarketError::unavailable("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MarketplaceApi for Flaky {
    async fn get_role(&self, c: &Caller) -> Result<Role, MarketError> {
        self.gate()?;
        self.inner.get_role(c).await
    }
    async fn get_profile(&self, c: &Caller) -> Result<Account, MarketError> {
        self.gate()?;
        self.inner.get_profile(c).await
    }
    async fn update_profile(&self, c: &Caller, p: ProfilePatch) -> Result<Account, MarketError> {
        self.gate()?;
        self.inner.update_profile(c, p).await
    }
    async fn create_listing(&self, c: &Caller, n: NewListing) -> Result<Listing, MarketError> {
        self.gate()?;
        self.inner.create_listing(c, n).await
    }
    async fn get_own_listings(&self, c: &Caller) -> Result<Vec<Listing>, MarketError> {
        self.gate()?;
        self.inner.get_own_listings(c).await
    }
    async fn get_all_listings(
        &self,
        c: &Caller,
        f: ListingFilter,
    ) -> Result<Vec<ListingView>, MarketError> {
        self.gate()?;
        self.inner.get_all_listings(c, f).await
    }
    async fn update_listing(
        &self,
        c: &Caller,
        id: Uuid,
        p: ListingPatch,
    ) -> Result<Listing, MarketError> {
        self.gate()?;
        self.inner.update_listing(c, id, p).await
    }
    async fn delete_listing(&self, c: &Caller, id: Uuid) -> Result<(), MarketError> {
        self.gate()?;
        self.inner.delete_listing(c, id).await
    }
    async fn record_view(&self, c: &Caller, id: Uuid) -> Result<Listing, MarketError> {
        self.gate()?;
        self.inner.record_view(c, id).await
    }
    async fn update_user_role(&self, c: &Caller, id: Uuid, r: Role) -> Result<Account, MarketError> {
        self.gate()?;
        self.inner.update_user_role(c, id, r).await
    }
    async fn delete_user(&self, c: &Caller, id: Uuid) -> Result<(), MarketError> {
        self.gate()?;
        self.inner.delete_user(c, id).await
    }
    async fn list_users(&self, c: &Caller) -> Result<Vec<Account>, MarketError> {
        self.gate()?;
        self.inner.list_users(c).await
    }
    async fn toggle_like(&self, c: &Caller, id: Uuid) -> Result<LikeState, MarketError> {
        self.gate()?;
        self.inner.toggle_like(c, id).await
    }
    async fn get_likes(&self, c: &Caller) -> Result<Vec<Uuid>, MarketError> {
        self.gate()?;
        self.inner.get_likes(c).await
    }
    async fn get_like_count(&self, c: &Caller, id: Uuid) -> Result<u64, MarketError> {
        self.gate()?;
        self.inner.get_like_count(c, id).await
    }
    async fn get_stats(&self, c: &Caller) -> Result<MarketStats, MarketError> {
        self.gate()?;
        self.inner.get_stats(c).await
    }
}

#[tokio::test]
async fn browse_hook_tracks_own_mutations() -> Result<()> {
    let api = create_test_client().await;
    let seller = member(1);
    let hook = ListingsHook::new(api.clone(), seller.clone(), ListingScope::All);

    hook.refetch(ListingFilter::default().category("books")).await?;
    assert!(hook.snapshot().data.is_empty());
    assert!(!hook.snapshot().loading);

    let book = hook.create(new_listing("Atlas")).await?;
    let mut lamp = new_listing("Lamp");
    lamp.category = "Electronics".into();
    hook.create(lamp).await?;

    // only the listing matching the active filter is prepended
    let snap = hook.snapshot();
    assert_eq!(snap.data.len(), 1);
    assert_eq!(snap.data[0].listing.id, book.id);
    assert_eq!(snap.data[0].seller_name, "Member No1");

    hook.update(
        book.id,
        ListingPatch {
            title: Some("World Atlas".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(hook.snapshot().data[0].listing.title, "World Atlas");
    assert_eq!(hook.snapshot().data[0].seller_name, "Member No1");

    // sold listings leave the browse view
    hook.update(
        book.id,
        ListingPatch {
            status: Some(ListingStatus::Sold),
            ..Default::default()
        },
    )
    .await?;
    assert!(hook.snapshot().data.is_empty());

    hook.refetch(ListingFilter::default()).await?;
    assert_eq!(hook.snapshot().data.len(), 1);
    Ok(())
}

#[tokio::test]
async fn own_hook_keeps_sold_listings_and_drops_deleted() -> Result<()> {
    let api = create_test_client().await;
    let hook = ListingsHook::new(api, member(1), ListingScope::Own);
    hook.load().await?;

    let a = hook.create(new_listing("A")).await?;
    let b = hook.create(new_listing("B")).await?;
    assert_eq!(hook.snapshot().data[0].listing.id, b.id);

    hook.update(
        a.id,
        ListingPatch {
            status: Some(ListingStatus::Sold),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(hook.snapshot().data.len(), 2);

    hook.delete(b.id).await?;
    let snap = hook.snapshot();
    assert_eq!(snap.data.len(), 1);
    assert_eq!(snap.data[0].listing.status, ListingStatus::Sold);
    Ok(())
}

#[tokio::test]
async fn failed_mutations_leave_cache_alone_and_are_not_retried() -> Result<()> {
    let flaky = Flaky::new(create_test_client().await);
    let hook = ListingsHook::new(flaky.clone(), member(1), ListingScope::Own);
    let kept = hook.create(new_listing("Keep me")).await?;
    let before = hook.snapshot();

    flaky.fail(true);
    let err = hook.create(new_listing("Lost")).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(flaky.calls(), 1);
    assert!(hook.delete(kept.id).await.is_err());
    assert_eq!(flaky.calls(), 2);
    assert_eq!(hook.snapshot(), before);

    // reads get one retry
    flaky.fail(true);
    assert!(hook.load().await.is_err());
    assert_eq!(flaky.calls(), 2);
    let snap = hook.snapshot();
    assert!(snap.error.is_some());
    assert_eq!(snap.data, before.data);
    Ok(())
}

#[tokio::test]
async fn likes_hook_mirrors_toggles() -> Result<()> {
    let api = create_test_client().await;
    let listing = api.create_listing(&member(1), new_listing("Poster")).await?;

    let hook = LikesHook::new(api.clone(), member(2));
    hook.load().await?;
    assert!(!hook.is_liked(listing.id));

    let state = hook.toggle(listing.id).await?;
    assert!(state.liked);
    assert!(hook.is_liked(listing.id));

    let fresh = LikesHook::new(api, member(2));
    fresh.load().await?;
    assert!(fresh.is_liked(listing.id));

    hook.toggle(listing.id).await?;
    assert!(!hook.is_liked(listing.id));
    Ok(())
}

#[tokio::test]
async fn session_hook_follows_identity() -> Result<()> {
    let flaky = Flaky::new(create_test_client().await);
    let session = SessionHook::new(flaky.clone());

    let snap = session.snapshot();
    assert!(!snap.loaded);
    assert!(!snap.is_authenticated);

    session.sync(IdentityState::Anonymous).await?;
    let snap = session.snapshot();
    assert!(snap.loaded);
    assert!(!snap.is_authenticated);
    assert_eq!(snap.role, None);

    let admin = common::admin();
    session
        .sync(IdentityState::Authenticated(admin.clone()))
        .await?;
    let snap = session.snapshot();
    assert!(snap.is_authenticated);
    assert!(snap.is_admin);
    assert!(!snap.is_blocked);

    // same identity again: no extra query
    flaky.fail(false);
    session
        .sync(IdentityState::Authenticated(admin.clone()))
        .await?;
    assert_eq!(flaky.calls(), 0);

    // refresh always re-queries and picks up role changes
    let me = member(3);
    session.sync(IdentityState::Authenticated(me.clone())).await?;
    let my_id = session.snapshot().profile.map(|p| p.id).unwrap_or_default();
    flaky.update_user_role(&admin, my_id, Role::Blocked).await?;
    session.refresh().await?;
    let snap = session.snapshot();
    assert!(snap.is_blocked);
    assert_eq!(snap.role, Some(Role::Blocked));

    flaky.fail(true);
    assert!(session.refresh().await.is_err());
    assert!(session.snapshot().error.is_some());
    Ok(())
}

#[tokio::test]
async fn contact_link_uses_normalized_number() -> Result<()> {
    let api = create_test_client().await;
    let listing = api
        .create_listing(&member(1), new_listing("Tom & Jerry DVD"))
        .await?;
    assert_eq!(
        listing_contact_link(&listing).as_deref(),
        Some(
            "https://wa.me/14155552671?text=Hi%21%20I%27m%20interested%20in%20your%20listing%3A%20Tom%20%26%20Jerry%20DVD"
        )
    );
    Ok(())
}
