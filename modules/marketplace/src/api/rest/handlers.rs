use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, response::Json, Extension};
use httpkit::{request_id::XRequestId, ProblemResponse};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::api::rest::dto::{
    AccountReply, AccountsReply, Action, BridgeReply, BridgeRequest, ClaimsPayload, CountReply,
    CreateListingReq, LikeReply, LikesReply, ListingFilterReq, ListingRef, ListingReply,
    ListingsReply, RoleReply, StatsReply, SuccessReply, UpdateListingReq, UpdateProfileReq,
    UpdateUserRoleReq, UserRef,
};
use crate::api::rest::error::{from_domain, invalid_input, problem_for};
use crate::contract::error::MarketError;
use crate::contract::model::{Caller, Role};
use crate::domain::service::Service;

/// `POST /bridge`: the single entry point for every marketplace action.
#[utoipa::path(
    post,
    path = "/bridge",
    tag = "bridge",
    operation_id = "marketplace.bridge",
    request_body = BridgeRequest,
    responses(
        (status = 200, description = "Action result; shape depends on the action", body = BridgeReply),
        (status = 400, description = "Invalid input", body = httpkit::Problem),
        (status = 403, description = "Forbidden", body = httpkit::Problem),
        (status = 404, description = "Not found", body = httpkit::Problem),
        (status = 503, description = "Store unavailable", body = httpkit::Problem),
        (status = 500, description = "Internal error", body = httpkit::Problem),
    )
)]
pub async fn bridge(
    Extension(svc): Extension<Arc<Service>>,
    request_id: Option<Extension<XRequestId>>,
    body: Result<Json<BridgeRequest>, JsonRejection>,
) -> Result<Json<BridgeReply>, ProblemResponse> {
    let request_id = request_id.map(|Extension(XRequestId(id))| id);
    let Json(req) = body.map_err(|rejection| {
        warn!(error = %rejection, "Rejected bridge request body");
        invalid_input(
            "Invalid request body",
            Some(rejection.body_text()),
            request_id.clone(),
        )
    })?;

    info!(action = %req.action, "Processing bridge action");
    let action = req.action.clone();
    match dispatch(&svc, req).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            match &e {
                MarketError::Internal => error!(action = %action, "Bridge action failed"),
                other => info!(action = %action, error = %other, "Bridge action rejected"),
            }
            Err(problem_for(&e, request_id))
        }
    }
}

/// Decode the envelope and run the action against `svc`.
pub async fn dispatch(svc: &Service, req: BridgeRequest) -> Result<BridgeReply, MarketError> {
    let action = Action::parse(&req.action)
        .ok_or_else(|| MarketError::invalid_input(format!("Invalid action: {}", req.action)))?;

    let payload = match req.payload {
        Some(serde_json::Value::Null) | None => serde_json::Value::Object(Default::default()),
        Some(v) => v,
    };
    // A mistyped claim is rejected rather than silently dropped.
    let claims: ClaimsPayload = decode(action, payload.clone())?;
    let caller = Caller {
        external_id: req.external_id,
        email: claims.email,
        first_name: claims.first_name,
        last_name: claims.last_name,
    };

    let reply = match action {
        Action::GetRole => BridgeReply::Role(RoleReply {
            role: svc.get_role(&caller).await.map_err(from_domain)?.into(),
        }),
        Action::GetProfile => BridgeReply::Account(AccountReply {
            account: svc.get_profile(&caller).await.map_err(from_domain)?.into(),
        }),
        Action::UpdateProfile => {
            let req: UpdateProfileReq = decode(action, payload)?;
            let account = svc
                .update_profile(&caller, req.into())
                .await
                .map_err(from_domain)?;
            BridgeReply::Account(AccountReply {
                account: account.into(),
            })
        }
        Action::CreateListing => {
            let req: CreateListingReq = decode(action, payload)?;
            let listing = svc
                .create_listing(&caller, req.into())
                .await
                .map_err(from_domain)?;
            BridgeReply::Listing(ListingReply {
                listing: listing.into(),
            })
        }
        Action::GetOwnListings => {
            let listings = svc.get_own_listings(&caller).await.map_err(from_domain)?;
            BridgeReply::Listings(ListingsReply {
                listings: listings.into_iter().map(Into::into).collect(),
            })
        }
        Action::GetAllListings => {
            let filter: ListingFilterReq = decode(action, payload)?;
            let listings = svc
                .get_all_listings(&caller, filter.into())
                .await
                .map_err(from_domain)?;
            BridgeReply::Listings(ListingsReply {
                listings: listings.into_iter().map(Into::into).collect(),
            })
        }
        Action::UpdateListing => {
            let req: UpdateListingReq = decode(action, payload)?;
            let listing = svc
                .update_listing(&caller, req.listing_id, req.updates.into())
                .await
                .map_err(from_domain)?;
            BridgeReply::Listing(ListingReply {
                listing: listing.into(),
            })
        }
        Action::DeleteListing => {
            let target: ListingRef = decode(action, payload)?;
            svc.delete_listing(&caller, target.listing_id)
                .await
                .map_err(from_domain)?;
            BridgeReply::Success(SuccessReply { success: true })
        }
        Action::RecordView => {
            let target: ListingRef = decode(action, payload)?;
            let listing = svc
                .record_view(&caller, target.listing_id)
                .await
                .map_err(from_domain)?;
            BridgeReply::Listing(ListingReply {
                listing: listing.into(),
            })
        }
        Action::UpdateUserRole => {
            let req: UpdateUserRoleReq = decode(action, payload)?;
            let role: Role = req.role.parse().map_err(MarketError::invalid_input)?;
            let account = svc
                .update_user_role(&caller, req.user_id, role)
                .await
                .map_err(from_domain)?;
            BridgeReply::Account(AccountReply {
                account: account.into(),
            })
        }
        Action::DeleteUser => {
            let target: UserRef = decode(action, payload)?;
            svc.delete_user(&caller, target.user_id)
                .await
                .map_err(from_domain)?;
            BridgeReply::Success(SuccessReply { success: true })
        }
        Action::ListUsers => {
            let accounts = svc.list_users(&caller).await.map_err(from_domain)?;
            BridgeReply::Accounts(AccountsReply {
                accounts: accounts.into_iter().map(Into::into).collect(),
            })
        }
        Action::ToggleLike => {
            let target: ListingRef = decode(action, payload)?;
            let state = svc
                .toggle_like(&caller, target.listing_id)
                .await
                .map_err(from_domain)?;
            BridgeReply::Like(LikeReply::from(state))
        }
        Action::GetLikes => BridgeReply::Likes(LikesReply {
            listing_ids: svc.get_likes(&caller).await.map_err(from_domain)?,
        }),
        Action::GetLikeCount => {
            let target: ListingRef = decode(action, payload)?;
            BridgeReply::Count(CountReply {
                count: svc
                    .get_like_count(&caller, target.listing_id)
                    .await
                    .map_err(from_domain)?,
            })
        }
        Action::GetStats => BridgeReply::Stats(StatsReply {
            stats: svc.get_stats(&caller).await.map_err(from_domain)?.into(),
        }),
    };
    Ok(reply)
}

fn decode<T: DeserializeOwned>(action: Action, payload: serde_json::Value) -> Result<T, MarketError> {
    serde_json::from_value(payload).map_err(|e| {
        MarketError::invalid_input(format!("Invalid payload for {}: {e}", action.as_str()))
    })
}
