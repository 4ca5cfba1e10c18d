use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::MarketplaceConfig;
use crate::contract::model::{
    Account, Caller, LikeState, Listing, ListingFilter, ListingPatch, ListingStatus, ListingView,
    MarketStats, NewListing, ProfilePatch, Role,
};
use crate::domain::error::DomainError;
use crate::domain::ports::{AuditEntry, AuditPort};
use crate::domain::repo::{AccountsRepository, LikesRepository, ListingsRepository, OwnerGuard};
use crate::domain::validation;

/// The Authorization Bridge: resolves the caller's account, enforces role and
/// ownership rules, then performs one store round trip.
///
/// Holds no per-caller state; every call re-reads roles and listings.
#[derive(Clone)]
pub struct Service {
    accounts: Arc<dyn AccountsRepository>,
    listings: Arc<dyn ListingsRepository>,
    likes: Arc<dyn LikesRepository>,
    audit: Arc<dyn AuditPort>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Lower-cased.
    pub bootstrap_admins: Vec<String>,
    pub placeholder_email_domain: String,
    /// Never above `validation::MAX_IMAGES`.
    pub max_images: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from(&MarketplaceConfig::default())
    }
}

impl From<&MarketplaceConfig> for ServiceConfig {
    fn from(cfg: &MarketplaceConfig) -> Self {
        if cfg.max_images > validation::MAX_IMAGES {
            warn!(
                configured = cfg.max_images,
                limit = validation::MAX_IMAGES,
                "max_images exceeds the listing image limit, clamping"
            );
        }
        Self {
            bootstrap_admins: cfg
                .bootstrap_admins
                .iter()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            placeholder_email_domain: cfg.placeholder_email_domain.clone(),
            max_images: cfg.max_images.min(validation::MAX_IMAGES),
        }
    }
}

impl Service {
    pub fn new(
        accounts: Arc<dyn AccountsRepository>,
        listings: Arc<dyn ListingsRepository>,
        likes: Arc<dyn LikesRepository>,
        audit: Arc<dyn AuditPort>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            accounts,
            listings,
            likes,
            audit,
            config,
        }
    }

    /// Look the caller up by external id, creating the account on first
    /// contact. Concurrent first calls converge on a single row.
    #[instrument(
        name = "marketplace.service.resolve_account",
        skip_all,
        fields(external_id = %caller.external_id)
    )]
    pub async fn resolve_account(&self, caller: &Caller) -> Result<Account, DomainError> {
        let external_id = caller.external_id.trim();
        if external_id.is_empty() {
            return Err(DomainError::MissingExternalId);
        }

        if let Some(found) = self
            .accounts
            .find_by_external_id(external_id)
            .await
            .map_err(DomainError::from_store)?
        {
            return Ok(found);
        }

        let email = caller
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "user_{external_id}@{}",
                    self.config.placeholder_email_domain
                )
            });
        let role = if self.config.bootstrap_admins.contains(&email.to_lowercase()) {
            Role::Admin
        } else {
            Role::Member
        };
        let now = Utc::now();
        let candidate = Account {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            email,
            first_name: claim_name(caller.first_name.as_deref()),
            last_name: claim_name(caller.last_name.as_deref()),
            role,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .accounts
            .insert_if_absent(candidate)
            .await
            .map_err(DomainError::from_store)?;

        let account = self
            .accounts
            .find_by_external_id(external_id)
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::database("account missing after insert"))?;

        if created {
            info!(account_id = %account.id, role = %account.role, "Created account");
            self.audit(
                AuditEntry::new(Some(account.id), "account.create")
                    .target(account.id)
                    .detail(account.role.as_str()),
            )
            .await;
        }
        Ok(account)
    }

    #[instrument(name = "marketplace.service.get_role", skip_all)]
    pub async fn get_role(&self, caller: &Caller) -> Result<Role, DomainError> {
        Ok(self.resolve_account(caller).await?.role)
    }

    #[instrument(name = "marketplace.service.get_profile", skip_all)]
    pub async fn get_profile(&self, caller: &Caller) -> Result<Account, DomainError> {
        self.resolve_account(caller).await
    }

    #[instrument(name = "marketplace.service.update_profile", skip_all)]
    pub async fn update_profile(
        &self,
        caller: &Caller,
        patch: ProfilePatch,
    ) -> Result<Account, DomainError> {
        let (first, last) = validation::profile_patch(patch)?;
        let me = self.resolve_account(caller).await?;

        let updated = self
            .accounts
            .update_names(me.id, first, last, Utc::now())
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::account_not_found(me.id))?;

        self.audit(AuditEntry::new(Some(me.id), "account.update_profile").target(me.id))
            .await;
        Ok(updated)
    }

    #[instrument(name = "marketplace.service.create_listing", skip_all)]
    pub async fn create_listing(
        &self,
        caller: &Caller,
        new_listing: NewListing,
    ) -> Result<Listing, DomainError> {
        let me = self.resolve_account(caller).await?;
        if me.role == Role::Blocked {
            return Err(DomainError::AccountBlocked);
        }
        let clean = validation::new_listing(new_listing, self.config.max_images)?;

        let now = Utc::now();
        let listing = Listing {
            id: Uuid::new_v4(),
            owner_id: me.id,
            title: clean.title,
            description: clean.description,
            price: clean.price,
            category: clean.category,
            location: clean.location,
            condition: clean.condition,
            images: clean.images,
            contact_number: clean.contact_number,
            status: ListingStatus::Active,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.listings
            .insert(listing.clone())
            .await
            .map_err(DomainError::from_store)?;

        info!(listing_id = %listing.id, owner_id = %me.id, "Created listing");
        self.audit(AuditEntry::new(Some(me.id), "listing.create").target(listing.id))
            .await;
        Ok(listing)
    }

    #[instrument(name = "marketplace.service.get_own_listings", skip_all)]
    pub async fn get_own_listings(&self, caller: &Caller) -> Result<Vec<Listing>, DomainError> {
        let me = self.resolve_account(caller).await?;
        let listings = self
            .listings
            .list_by_owner(me.id)
            .await
            .map_err(DomainError::from_store)?;
        debug!(count = listings.len(), "Loaded own listings");
        Ok(listings)
    }

    #[instrument(name = "marketplace.service.get_all_listings", skip_all, fields(filter = ?filter))]
    pub async fn get_all_listings(
        &self,
        caller: &Caller,
        filter: ListingFilter,
    ) -> Result<Vec<ListingView>, DomainError> {
        self.resolve_account(caller).await?;
        let listings = self
            .listings
            .list_active(&filter.normalized())
            .await
            .map_err(DomainError::from_store)?;
        debug!(count = listings.len(), "Loaded active listings");
        Ok(listings)
    }

    #[instrument(name = "marketplace.service.update_listing", skip_all, fields(listing_id = %listing_id))]
    pub async fn update_listing(
        &self,
        caller: &Caller,
        listing_id: Uuid,
        patch: ListingPatch,
    ) -> Result<Listing, DomainError> {
        let me = self.resolve_account(caller).await?;
        if me.role == Role::Blocked {
            return Err(DomainError::AccountBlocked);
        }
        let mut listing = self.load_listing(listing_id).await?;
        let guard = Self::write_guard(&me, &listing)?;
        let clean = validation::listing_patch(patch, self.config.max_images)?;

        if let Some(title) = clean.title {
            listing.title = title;
        }
        if let Some(description) = clean.description {
            listing.description = description;
        }
        if let Some(price) = clean.price {
            listing.price = price;
        }
        if let Some(category) = clean.category {
            listing.category = category;
        }
        if let Some(location) = clean.location {
            listing.location = location;
        }
        if let Some(condition) = clean.condition {
            listing.condition = condition;
        }
        if let Some(images) = clean.images {
            listing.images = images;
        }
        if let Some(contact_number) = clean.contact_number {
            listing.contact_number = contact_number;
        }
        if let Some(status) = clean.status {
            listing.status = status;
        }
        listing.updated_at = Utc::now();

        let written = self
            .listings
            .update(listing.clone(), guard)
            .await
            .map_err(DomainError::from_store)?;
        if !written {
            return Err(DomainError::listing_not_found(listing_id));
        }

        info!(by_admin = matches!(guard, OwnerGuard::Any), "Updated listing");
        self.audit(AuditEntry::new(Some(me.id), "listing.update").target(listing_id))
            .await;
        Ok(listing)
    }

    /// Blocked owners may still remove their own listings.
    #[instrument(name = "marketplace.service.delete_listing", skip_all, fields(listing_id = %listing_id))]
    pub async fn delete_listing(&self, caller: &Caller, listing_id: Uuid) -> Result<(), DomainError> {
        let me = self.resolve_account(caller).await?;
        let listing = self.load_listing(listing_id).await?;
        let guard = Self::write_guard(&me, &listing)?;

        let deleted = self
            .listings
            .delete(listing_id, guard)
            .await
            .map_err(DomainError::from_store)?;
        if !deleted {
            return Err(DomainError::listing_not_found(listing_id));
        }

        info!(by_admin = matches!(guard, OwnerGuard::Any), "Deleted listing");
        self.audit(AuditEntry::new(Some(me.id), "listing.delete").target(listing_id))
            .await;
        Ok(())
    }

    #[instrument(name = "marketplace.service.record_view", skip_all, fields(listing_id = %listing_id))]
    pub async fn record_view(&self, caller: &Caller, listing_id: Uuid) -> Result<Listing, DomainError> {
        self.resolve_account(caller).await?;
        self.listings
            .increment_views(listing_id)
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::listing_not_found(listing_id))
    }

    #[instrument(name = "marketplace.service.update_user_role", skip_all, fields(target = %user_id, role = %role))]
    pub async fn update_user_role(
        &self,
        caller: &Caller,
        user_id: Uuid,
        role: Role,
    ) -> Result<Account, DomainError> {
        let me = self.resolve_account(caller).await?;
        if me.role != Role::Admin {
            return Err(DomainError::AdminRequired {
                action: "change roles",
            });
        }
        if me.id == user_id {
            return Err(DomainError::SelfRoleChange);
        }
        let target = self.load_account(user_id).await?;
        if target.role == Role::Admin {
            return Err(DomainError::AdminRoleChange);
        }

        let updated = self
            .accounts
            .set_role(user_id, role, Utc::now())
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::account_not_found(user_id))?;

        info!(from = %target.role, to = %role, "Changed account role");
        self.audit(
            AuditEntry::new(Some(me.id), "account.set_role")
                .target(user_id)
                .detail(role.as_str()),
        )
        .await;
        Ok(updated)
    }

    #[instrument(name = "marketplace.service.delete_user", skip_all, fields(target = %user_id))]
    pub async fn delete_user(&self, caller: &Caller, user_id: Uuid) -> Result<(), DomainError> {
        let me = self.resolve_account(caller).await?;
        if me.role != Role::Admin {
            return Err(DomainError::AdminRequired {
                action: "delete users",
            });
        }
        if me.id == user_id {
            return Err(DomainError::SelfDelete);
        }
        let target = self.load_account(user_id).await?;
        if target.role == Role::Admin {
            return Err(DomainError::AdminDelete);
        }

        let deleted = self
            .accounts
            .delete_cascade(user_id)
            .await
            .map_err(DomainError::from_store)?;
        if !deleted {
            return Err(DomainError::account_not_found(user_id));
        }

        warn!("Deleted account with its listings and likes");
        self.audit(AuditEntry::new(Some(me.id), "account.delete").target(user_id))
            .await;
        Ok(())
    }

    #[instrument(name = "marketplace.service.list_users", skip_all)]
    pub async fn list_users(&self, caller: &Caller) -> Result<Vec<Account>, DomainError> {
        let me = self.resolve_account(caller).await?;
        if me.role != Role::Admin {
            return Err(DomainError::AdminRequired {
                action: "list users",
            });
        }
        self.accounts.list().await.map_err(DomainError::from_store)
    }

    #[instrument(name = "marketplace.service.toggle_like", skip_all, fields(listing_id = %listing_id))]
    pub async fn toggle_like(&self, caller: &Caller, listing_id: Uuid) -> Result<LikeState, DomainError> {
        let me = self.resolve_account(caller).await?;
        if me.role == Role::Blocked {
            return Err(DomainError::AccountBlocked);
        }
        self.load_listing(listing_id).await?;

        let (liked, like_count) = self
            .likes
            .toggle(me.id, listing_id)
            .await
            .map_err(DomainError::from_store)?;

        self.audit(
            AuditEntry::new(Some(me.id), if liked { "like.add" } else { "like.remove" })
                .target(listing_id),
        )
        .await;
        Ok(LikeState {
            listing_id,
            liked,
            like_count,
        })
    }

    #[instrument(name = "marketplace.service.get_likes", skip_all)]
    pub async fn get_likes(&self, caller: &Caller) -> Result<Vec<Uuid>, DomainError> {
        let me = self.resolve_account(caller).await?;
        self.likes
            .liked_listing_ids(me.id)
            .await
            .map_err(DomainError::from_store)
    }

    #[instrument(name = "marketplace.service.get_like_count", skip_all, fields(listing_id = %listing_id))]
    pub async fn get_like_count(&self, caller: &Caller, listing_id: Uuid) -> Result<u64, DomainError> {
        self.resolve_account(caller).await?;
        self.load_listing(listing_id).await?;
        self.likes
            .count_for_listing(listing_id)
            .await
            .map_err(DomainError::from_store)
    }

    #[instrument(name = "marketplace.service.get_stats", skip_all)]
    pub async fn get_stats(&self, caller: &Caller) -> Result<MarketStats, DomainError> {
        let me = self.resolve_account(caller).await?;
        let global = self
            .listings
            .global_stats()
            .await
            .map_err(DomainError::from_store)?;
        let mine = self
            .listings
            .user_stats(me.id)
            .await
            .map_err(DomainError::from_store)?;
        Ok(MarketStats { global, mine })
    }

    /// Operator command: promote the account registered under `email`.
    #[instrument(name = "marketplace.service.grant_admin", skip(self))]
    pub async fn grant_admin_by_email(&self, email: &str) -> Result<Account, DomainError> {
        let account = self
            .accounts
            .find_by_email(email.trim())
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::UnknownEmail {
                email: email.trim().to_string(),
            })?;
        if account.role == Role::Admin {
            info!(account_id = %account.id, "Account is already admin");
            return Ok(account);
        }

        let updated = self
            .accounts
            .set_role(account.id, Role::Admin, Utc::now())
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::account_not_found(account.id))?;

        info!(account_id = %updated.id, "Granted admin role");
        self.audit(
            AuditEntry::new(None, "account.grant_admin")
                .target(updated.id)
                .detail(updated.email.clone()),
        )
        .await;
        Ok(updated)
    }

    // --- helpers ---

    async fn load_listing(&self, id: Uuid) -> Result<Listing, DomainError> {
        self.listings
            .find_by_id(id)
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::listing_not_found(id))
    }

    async fn load_account(&self, id: Uuid) -> Result<Account, DomainError> {
        self.accounts
            .find_by_id(id)
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::account_not_found(id))
    }

    fn write_guard(me: &Account, listing: &Listing) -> Result<OwnerGuard, DomainError> {
        if me.role == Role::Admin {
            return Ok(OwnerGuard::Any);
        }
        if listing.owner_id != me.id {
            return Err(DomainError::NotListingOwner {
                listing_id: listing.id,
            });
        }
        Ok(OwnerGuard::Owner(me.id))
    }

    async fn audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(entry).await {
            debug!("Audit record failed (continuing): {}", e);
        }
    }
}

/// Identity-provider names are trusted but capped and trimmed.
fn claim_name(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.chars().take(validation::MAX_PERSON_NAME).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_images_is_clamped_to_listing_limit() {
        let wide = MarketplaceConfig {
            max_images: 10,
            ..Default::default()
        };
        assert_eq!(ServiceConfig::from(&wide).max_images, validation::MAX_IMAGES);

        let narrow = MarketplaceConfig {
            max_images: 3,
            ..Default::default()
        };
        assert_eq!(ServiceConfig::from(&narrow).max_images, 3);
    }
}
