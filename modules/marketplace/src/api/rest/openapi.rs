use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus Market Bridge",
        description = "Single-entry authorization bridge of the campus marketplace"
    ),
    paths(handlers::bridge),
    components(schemas(
        dto::BridgeRequest,
        dto::BridgeReply,
        dto::CreateListingReq,
        dto::UpdateListingReq,
        dto::ListingUpdatesReq,
        dto::ListingRef,
        dto::ListingFilterReq,
        dto::UpdateUserRoleReq,
        dto::UserRef,
        dto::UpdateProfileReq,
        dto::ListingDto,
        dto::AccountDto,
        dto::StatsDto,
        dto::RoleDto,
        dto::ListingStatusDto,
        httpkit::Problem,
    )),
    tags((name = "bridge", description = "Marketplace actions"))
)]
pub struct ApiDoc;

pub fn document() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
