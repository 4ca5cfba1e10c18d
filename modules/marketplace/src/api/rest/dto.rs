use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{
    Account, GlobalStats, LikeState, Listing, ListingFilter, ListingPatch, ListingStatus,
    ListingView, MarketStats, NewListing, ProfilePatch, Role, UserStats,
};

/// Bridge action names. Older client builds still send the product-era names,
/// which are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetRole,
    GetProfile,
    UpdateProfile,
    CreateListing,
    GetOwnListings,
    GetAllListings,
    UpdateListing,
    DeleteListing,
    RecordView,
    UpdateUserRole,
    DeleteUser,
    ListUsers,
    ToggleLike,
    GetLikes,
    GetLikeCount,
    GetStats,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GetRole => "getRole",
            Action::GetProfile => "getProfile",
            Action::UpdateProfile => "updateProfile",
            Action::CreateListing => "createListing",
            Action::GetOwnListings => "getOwnListings",
            Action::GetAllListings => "getAllListings",
            Action::UpdateListing => "updateListing",
            Action::DeleteListing => "deleteListing",
            Action::RecordView => "recordView",
            Action::UpdateUserRole => "updateUserRole",
            Action::DeleteUser => "deleteUser",
            Action::ListUsers => "listUsers",
            Action::ToggleLike => "toggleLike",
            Action::GetLikes => "getLikes",
            Action::GetLikeCount => "getLikeCount",
            Action::GetStats => "getStats",
        }
    }

    pub fn parse(name: &str) -> Option<Action> {
        let action = match name {
            "getRole" | "getUserRole" => Action::GetRole,
            "getProfile" | "createProfile" => Action::GetProfile,
            "updateProfile" => Action::UpdateProfile,
            "createListing" | "createProduct" => Action::CreateListing,
            "getOwnListings" | "getUserProducts" => Action::GetOwnListings,
            "getAllListings" | "getAllProducts" => Action::GetAllListings,
            "updateListing" | "updateProduct" => Action::UpdateListing,
            "deleteListing" | "deleteProduct" => Action::DeleteListing,
            "recordView" => Action::RecordView,
            "updateUserRole" => Action::UpdateUserRole,
            "deleteUser" => Action::DeleteUser,
            "listUsers" => Action::ListUsers,
            "toggleLike" => Action::ToggleLike,
            "getLikes" => Action::GetLikes,
            "getLikeCount" => Action::GetLikeCount,
            "getStats" => Action::GetStats,
            _ => return None,
        };
        Some(action)
    }
}

// ---------- request side ----------

/// Envelope of every Bridge call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    /// Identity-provider user id of the caller.
    #[serde(default, alias = "clerkUserId")]
    pub external_id: String,
    pub action: String,
    /// Action-specific fields plus optional identity claims
    /// (`email`, `firstName`, `lastName`).
    #[serde(default, alias = "data", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}

/// Identity claims read from any payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsPayload {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingReq {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(
        default,
        alias = "whatsapp_number",
        alias = "whatsappNumber",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_number: Option<String>,
}

/// Fields an update may touch. Anything else (owner, counters) is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListingUpdatesReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Empty string clears.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Empty string clears.
    #[serde(
        default,
        alias = "whatsapp_number",
        alias = "whatsappNumber",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatusDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingReq {
    #[serde(alias = "productId")]
    pub listing_id: Uuid,
    pub updates: ListingUpdatesReq,
}

/// Payload of actions addressing a single listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingRef {
    #[serde(alias = "productId")]
    pub listing_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilterReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRoleReq {
    pub user_id: Uuid,
    /// `member`, `admin` or `blocked`.
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

// ---------- shared DTOs ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleDto {
    Member,
    Admin,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatusDto {
    Active,
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub category: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    pub status: ListingStatusDto,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present on browse results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub display_name: String,
    pub role: RoleDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatsDto {
    pub total_users: u64,
    pub total_listings: u64,
    pub total_views: i64,
    pub locations_served: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsDto {
    pub items_listed: u64,
    pub items_sold: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_earnings: Decimal,
    pub likes_given: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsDto {
    pub global: GlobalStatsDto,
    pub mine: UserStatsDto,
}

// ---------- replies ----------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleReply {
    pub role: RoleDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingReply {
    pub listing: ListingDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingsReply {
    pub listings: Vec<ListingDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountReply {
    pub account: AccountDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountsReply {
    pub accounts: Vec<AccountDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeReply {
    pub listing_id: Uuid,
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikesReply {
    pub listing_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountReply {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsReply {
    pub stats: StatsDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessReply {
    pub success: bool,
}

/// Success body of `POST /bridge`; the shape depends on the action.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum BridgeReply {
    Role(RoleReply),
    Listing(ListingReply),
    Listings(ListingsReply),
    Account(AccountReply),
    Accounts(AccountsReply),
    Like(LikeReply),
    Likes(LikesReply),
    Count(CountReply),
    Stats(StatsReply),
    Success(SuccessReply),
}

// ---------- conversions ----------

impl From<Role> for RoleDto {
    fn from(r: Role) -> Self {
        match r {
            Role::Member => RoleDto::Member,
            Role::Admin => RoleDto::Admin,
            Role::Blocked => RoleDto::Blocked,
        }
    }
}

impl From<RoleDto> for Role {
    fn from(r: RoleDto) -> Self {
        match r {
            RoleDto::Member => Role::Member,
            RoleDto::Admin => Role::Admin,
            RoleDto::Blocked => Role::Blocked,
        }
    }
}

impl From<ListingStatus> for ListingStatusDto {
    fn from(s: ListingStatus) -> Self {
        match s {
            ListingStatus::Active => ListingStatusDto::Active,
            ListingStatus::Sold => ListingStatusDto::Sold,
        }
    }
}

impl From<ListingStatusDto> for ListingStatus {
    fn from(s: ListingStatusDto) -> Self {
        match s {
            ListingStatusDto::Active => ListingStatus::Active,
            ListingStatusDto::Sold => ListingStatus::Sold,
        }
    }
}

impl From<Listing> for ListingDto {
    fn from(l: Listing) -> Self {
        Self {
            id: l.id,
            owner_id: l.owner_id,
            title: l.title,
            description: l.description,
            price: l.price,
            category: l.category,
            location: l.location,
            condition: l.condition,
            images: l.images,
            contact_number: l.contact_number,
            status: l.status.into(),
            view_count: l.view_count,
            created_at: l.created_at,
            updated_at: l.updated_at,
            seller_name: None,
        }
    }
}

impl From<ListingView> for ListingDto {
    fn from(v: ListingView) -> Self {
        Self {
            seller_name: Some(v.seller_name),
            ..ListingDto::from(v.listing)
        }
    }
}

impl From<ListingDto> for Listing {
    fn from(d: ListingDto) -> Self {
        Self {
            id: d.id,
            owner_id: d.owner_id,
            title: d.title,
            description: d.description,
            price: d.price.round_dp(2),
            category: d.category,
            location: d.location,
            condition: d.condition,
            images: d.images,
            contact_number: d.contact_number,
            status: d.status.into(),
            view_count: d.view_count,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl From<ListingDto> for ListingView {
    fn from(mut d: ListingDto) -> Self {
        let seller_name = d.seller_name.take().unwrap_or_default();
        Self {
            listing: d.into(),
            seller_name,
        }
    }
}

impl From<Account> for AccountDto {
    fn from(a: Account) -> Self {
        Self {
            display_name: a.display_name(),
            id: a.id,
            external_id: a.external_id,
            email: a.email,
            first_name: a.first_name,
            last_name: a.last_name,
            role: a.role.into(),
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

impl From<AccountDto> for Account {
    fn from(d: AccountDto) -> Self {
        Self {
            id: d.id,
            external_id: d.external_id,
            email: d.email,
            first_name: d.first_name,
            last_name: d.last_name,
            role: d.role.into(),
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl From<MarketStats> for StatsDto {
    fn from(s: MarketStats) -> Self {
        Self {
            global: GlobalStatsDto {
                total_users: s.global.total_users,
                total_listings: s.global.total_listings,
                total_views: s.global.total_views,
                locations_served: s.global.locations_served,
            },
            mine: UserStatsDto {
                items_listed: s.mine.items_listed,
                items_sold: s.mine.items_sold,
                total_earnings: s.mine.total_earnings,
                likes_given: s.mine.likes_given,
            },
        }
    }
}

impl From<StatsDto> for MarketStats {
    fn from(s: StatsDto) -> Self {
        Self {
            global: GlobalStats {
                total_users: s.global.total_users,
                total_listings: s.global.total_listings,
                total_views: s.global.total_views,
                locations_served: s.global.locations_served,
            },
            mine: UserStats {
                items_listed: s.mine.items_listed,
                items_sold: s.mine.items_sold,
                total_earnings: s.mine.total_earnings.round_dp(2),
                likes_given: s.mine.likes_given,
            },
        }
    }
}

impl From<LikeState> for LikeReply {
    fn from(s: LikeState) -> Self {
        Self {
            listing_id: s.listing_id,
            liked: s.liked,
            like_count: s.like_count,
        }
    }
}

impl From<LikeReply> for LikeState {
    fn from(r: LikeReply) -> Self {
        Self {
            listing_id: r.listing_id,
            liked: r.liked,
            like_count: r.like_count,
        }
    }
}

impl From<CreateListingReq> for NewListing {
    fn from(r: CreateListingReq) -> Self {
        Self {
            title: r.title,
            description: r.description,
            price: r.price,
            category: r.category,
            location: r.location,
            condition: r.condition,
            images: r.images,
            contact_number: r.contact_number,
        }
    }
}

impl From<NewListing> for CreateListingReq {
    fn from(n: NewListing) -> Self {
        Self {
            title: n.title,
            description: n.description,
            price: n.price,
            category: n.category,
            location: n.location,
            condition: n.condition,
            images: n.images,
            contact_number: n.contact_number,
        }
    }
}

impl From<ListingUpdatesReq> for ListingPatch {
    fn from(r: ListingUpdatesReq) -> Self {
        Self {
            title: r.title,
            description: r.description,
            price: r.price,
            category: r.category,
            location: r.location,
            condition: r.condition,
            images: r.images,
            contact_number: r.contact_number,
            status: r.status.map(Into::into),
        }
    }
}

impl From<ListingPatch> for ListingUpdatesReq {
    fn from(p: ListingPatch) -> Self {
        Self {
            title: p.title,
            description: p.description,
            price: p.price,
            category: p.category,
            location: p.location,
            condition: p.condition,
            images: p.images,
            contact_number: p.contact_number,
            status: p.status.map(Into::into),
        }
    }
}

impl From<ListingFilterReq> for ListingFilter {
    fn from(r: ListingFilterReq) -> Self {
        Self {
            category: r.category,
            location: r.location,
            search: r.search,
        }
    }
}

impl From<ListingFilter> for ListingFilterReq {
    fn from(f: ListingFilter) -> Self {
        Self {
            category: f.category,
            location: f.location,
            search: f.search,
        }
    }
}

impl From<UpdateProfileReq> for ProfilePatch {
    fn from(r: UpdateProfileReq) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
        }
    }
}

impl From<ProfilePatch> for UpdateProfileReq {
    fn from(p: ProfilePatch) -> Self {
        Self {
            first_name: p.first_name,
            last_name: p.last_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_action_names_resolve() {
        assert_eq!(Action::parse("createProduct"), Some(Action::CreateListing));
        assert_eq!(Action::parse("getUserRole"), Some(Action::GetRole));
        assert_eq!(Action::parse("getStats"), Some(Action::GetStats));
        assert_eq!(Action::parse("dropTables"), None);
        assert_eq!(Action::parse(Action::ToggleLike.as_str()), Some(Action::ToggleLike));
    }

    #[test]
    fn updates_reject_owner_change() {
        let res: Result<ListingUpdatesReq, _> =
            serde_json::from_value(json!({ "title": "x", "ownerId": Uuid::nil() }));
        assert!(res.is_err());
    }

    #[test]
    fn create_accepts_string_or_number_price_and_legacy_contact() {
        let a: CreateListingReq =
            serde_json::from_value(json!({ "price": 12.5, "whatsapp_number": "+14155552671" }))
                .unwrap();
        assert_eq!(a.price, Decimal::new(125, 1));
        assert_eq!(a.contact_number.as_deref(), Some("+14155552671"));
        let b: CreateListingReq = serde_json::from_value(json!({ "price": "7.25" })).unwrap();
        assert_eq!(b.price, Decimal::new(725, 2));
    }

    #[test]
    fn listing_price_is_a_json_number() {
        let now = Utc::now();
        let dto = ListingDto::from(Listing {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            title: "t".into(),
            description: "d".into(),
            price: Decimal::new(1999, 2),
            category: "Books".into(),
            location: "North".into(),
            condition: None,
            images: vec![],
            contact_number: None,
            status: ListingStatus::Sold,
            view_count: 3,
            created_at: now,
            updated_at: now,
        });
        let v = serde_json::to_value(&dto).unwrap();
        assert_eq!(v["price"], json!(19.99));
        assert_eq!(v["status"], json!("sold"));
        assert!(v.get("sellerName").is_none());
    }

    #[test]
    fn replies_serialize_flat() {
        let v = serde_json::to_value(BridgeReply::Role(RoleReply {
            role: RoleDto::Blocked,
        }))
        .unwrap();
        assert_eq!(v, json!({ "role": "blocked" }));
        let v = serde_json::to_value(BridgeReply::Success(SuccessReply { success: true })).unwrap();
        assert_eq!(v, json!({ "success": true }));
    }
}
