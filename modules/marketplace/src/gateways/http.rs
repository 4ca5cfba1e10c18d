//! Remote implementation of [`MarketplaceApi`] that talks to `POST /bridge`
//! over HTTP.

use async_trait::async_trait;
use httpkit::{Problem, TracedClient};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::api::rest::dto::{
    AccountReply, AccountsReply, Action, BridgeRequest, CountReply, CreateListingReq, LikeReply,
    LikesReply, ListingFilterReq, ListingRef, ListingReply, ListingUpdatesReq, ListingsReply,
    RoleReply, StatsReply, SuccessReply, UpdateListingReq, UpdateProfileReq, UpdateUserRoleReq,
    UserRef,
};
use crate::contract::{
    client::MarketplaceApi,
    error::MarketError,
    model::{
        Account, Caller, LikeState, Listing, ListingFilter, ListingPatch, ListingView,
        MarketStats, NewListing, ProfilePatch, Role,
    },
};
use crate::errors::ErrorCode;

#[derive(Clone)]
pub struct HttpMarketplaceClient {
    client: TracedClient,
    endpoint: Url,
}

impl HttpMarketplaceClient {
    /// `base` is the server root, e.g. `http://127.0.0.1:8087/`.
    pub fn new(client: TracedClient, base: &Url) -> anyhow::Result<Self> {
        let endpoint = base.join("bridge")?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(
        name = "marketplace.http.bridge",
        skip_all,
        fields(action = action.as_str(), endpoint = %self.endpoint)
    )]
    async fn call<R: DeserializeOwned>(
        &self,
        caller: &Caller,
        action: Action,
        payload: impl Serialize,
    ) -> Result<R, MarketError> {
        let payload = serde_json::to_value(payload).map_err(|e| {
            warn!(error = %e, "Failed to encode payload");
            MarketError::internal()
        })?;
        let body = BridgeRequest {
            external_id: caller.external_id.clone(),
            action: action.as_str().to_string(),
            payload: Some(with_claims(payload, caller, action)),
        };

        let resp = self
            .client
            .post_json(self.endpoint.as_str(), &body)
            .await
            .map_err(|e| {
                if e.is_decode() || e.is_builder() {
                    MarketError::internal()
                } else {
                    MarketError::unavailable(e.to_string())
                }
            })?;

        let status = resp.status();
        if status.is_success() {
            return resp.json::<R>().await.map_err(|e| {
                warn!(error = %e, "Malformed bridge reply");
                MarketError::internal()
            });
        }

        let problem = resp.json::<Problem>().await.ok();
        debug!(status = status.as_u16(), problem = ?problem, "Bridge call failed");
        Err(error_from_reply(status.as_u16(), problem))
    }
}

/// Merge identity claims into an object payload without overwriting
/// action fields. Profile updates carry names as data, not as claims.
fn with_claims(payload: Value, caller: &Caller, action: Action) -> Value {
    let mut map = match payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => return other,
    };
    let mut put = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            map.entry(key.to_string())
                .or_insert_with(|| Value::String(v.clone()));
        }
    };
    put("email", &caller.email);
    if action != Action::UpdateProfile {
        put("firstName", &caller.first_name);
        put("lastName", &caller.last_name);
    }
    Value::Object(map)
}

/// Catalog code wins; the status is the fallback for foreign error bodies.
pub fn error_from_reply(status: u16, problem: Option<Problem>) -> MarketError {
    let code = problem
        .as_ref()
        .and_then(|p| ErrorCode::from_code(&p.code));
    let message = problem
        .as_ref()
        .map(|p| match &p.details {
            Some(d) if status == 503 => d.clone(),
            _ => p.error.clone(),
        })
        .unwrap_or_else(|| format!("HTTP {status}"));

    match code {
        Some(ErrorCode::marketplace_invalid_input_v1) => MarketError::invalid_input(message),
        Some(ErrorCode::marketplace_forbidden_v1) => MarketError::forbidden(message),
        Some(ErrorCode::marketplace_not_found_v1) => MarketError::not_found(message),
        Some(ErrorCode::marketplace_unavailable_v1) => MarketError::unavailable(message),
        Some(ErrorCode::marketplace_internal_v1) => MarketError::internal(),
        None => match status {
            400 | 422 => MarketError::invalid_input(message),
            401 | 403 => MarketError::forbidden(message),
            404 => MarketError::not_found(message),
            408 | 429 | 502 | 503 | 504 => MarketError::unavailable(message),
            _ => MarketError::internal(),
        },
    }
}

#[derive(Serialize)]
struct Empty {}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceClient {
    async fn get_role(&self, caller: &Caller) -> Result<Role, MarketError> {
        let reply: RoleReply = self.call(caller, Action::GetRole, Empty {}).await?;
        Ok(reply.role.into())
    }

    async fn get_profile(&self, caller: &Caller) -> Result<Account, MarketError> {
        let reply: AccountReply = self.call(caller, Action::GetProfile, Empty {}).await?;
        Ok(reply.account.into())
    }

    async fn update_profile(
        &self,
        caller: &Caller,
        patch: ProfilePatch,
    ) -> Result<Account, MarketError> {
        let reply: AccountReply = self
            .call(caller, Action::UpdateProfile, UpdateProfileReq::from(patch))
            .await?;
        Ok(reply.account.into())
    }

    async fn create_listing(
        &self,
        caller: &Caller,
        new_listing: NewListing,
    ) -> Result<Listing, MarketError> {
        let reply: ListingReply = self
            .call(
                caller,
                Action::CreateListing,
                CreateListingReq::from(new_listing),
            )
            .await?;
        Ok(reply.listing.into())
    }

    async fn get_own_listings(&self, caller: &Caller) -> Result<Vec<Listing>, MarketError> {
        let reply: ListingsReply = self.call(caller, Action::GetOwnListings, Empty {}).await?;
        Ok(reply.listings.into_iter().map(Into::into).collect())
    }

    async fn get_all_listings(
        &self,
        caller: &Caller,
        filter: ListingFilter,
    ) -> Result<Vec<ListingView>, MarketError> {
        let reply: ListingsReply = self
            .call(caller, Action::GetAllListings, ListingFilterReq::from(filter))
            .await?;
        Ok(reply.listings.into_iter().map(Into::into).collect())
    }

    async fn update_listing(
        &self,
        caller: &Caller,
        listing_id: Uuid,
        patch: ListingPatch,
    ) -> Result<Listing, MarketError> {
        let req = UpdateListingReq {
            listing_id,
            updates: ListingUpdatesReq::from(patch),
        };
        let reply: ListingReply = self.call(caller, Action::UpdateListing, req).await?;
        Ok(reply.listing.into())
    }

    async fn delete_listing(&self, caller: &Caller, listing_id: Uuid) -> Result<(), MarketError> {
        let _: SuccessReply = self
            .call(caller, Action::DeleteListing, ListingRef { listing_id })
            .await?;
        Ok(())
    }

    async fn record_view(&self, caller: &Caller, listing_id: Uuid) -> Result<Listing, MarketError> {
        let reply: ListingReply = self
            .call(caller, Action::RecordView, ListingRef { listing_id })
            .await?;
        Ok(reply.listing.into())
    }

    async fn update_user_role(
        &self,
        caller: &Caller,
        user_id: Uuid,
        role: Role,
    ) -> Result<Account, MarketError> {
        let req = UpdateUserRoleReq {
            user_id,
            role: role.as_str().to_string(),
        };
        let reply: AccountReply = self.call(caller, Action::UpdateUserRole, req).await?;
        Ok(reply.account.into())
    }

    async fn delete_user(&self, caller: &Caller, user_id: Uuid) -> Result<(), MarketError> {
        let _: SuccessReply = self
            .call(caller, Action::DeleteUser, UserRef { user_id })
            .await?;
        Ok(())
    }

    async fn list_users(&self, caller: &Caller) -> Result<Vec<Account>, MarketError> {
        let reply: AccountsReply = self.call(caller, Action::ListUsers, Empty {}).await?;
        Ok(reply.accounts.into_iter().map(Into::into).collect())
    }

    async fn toggle_like(
        &self,
        caller: &Caller,
        listing_id: Uuid,
    ) -> Result<LikeState, MarketError> {
        let reply: LikeReply = self
            .call(caller, Action::ToggleLike, ListingRef { listing_id })
            .await?;
        Ok(reply.into())
    }

    async fn get_likes(&self, caller: &Caller) -> Result<Vec<Uuid>, MarketError> {
        let reply: LikesReply = self.call(caller, Action::GetLikes, Empty {}).await?;
        Ok(reply.listing_ids)
    }

    async fn get_like_count(&self, caller: &Caller, listing_id: Uuid) -> Result<u64, MarketError> {
        let reply: CountReply = self
            .call(caller, Action::GetLikeCount, ListingRef { listing_id })
            .await?;
        Ok(reply.count)
    }

    async fn get_stats(&self, caller: &Caller) -> Result<MarketStats, MarketError> {
        let reply: StatsReply = self.call(caller, Action::GetStats, Empty {}).await?;
        Ok(reply.stats.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claims_do_not_overwrite_payload() {
        let caller = Caller::new("ext-1")
            .with_email("a@x.edu")
            .with_name("Ada", "Lovelace");
        let merged = with_claims(json!({ "email": "keep@x.edu" }), &caller, Action::GetRole);
        assert_eq!(
            merged,
            json!({ "email": "keep@x.edu", "firstName": "Ada", "lastName": "Lovelace" })
        );

        let profile = with_claims(json!({ "lastName": "Byron" }), &caller, Action::UpdateProfile);
        assert_eq!(profile, json!({ "lastName": "Byron", "email": "a@x.edu" }));
    }

    #[test]
    fn foreign_errors_map_by_status() {
        assert!(matches!(error_from_reply(404, None), MarketError::NotFound { .. }));
        assert!(error_from_reply(504, None).is_retryable());
        assert_eq!(error_from_reply(418, None), MarketError::Internal);
    }
}
