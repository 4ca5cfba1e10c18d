use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::contract::text::{canonical_escape, fold, search_key};

/// Permission tier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Member,
    Admin,
    Blocked,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
            Role::Blocked => "blocked",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // "user" is the legacy name of the member tier
            "member" | "user" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            "blocked" => Ok(Role::Blocked),
            other => Err(format!(
                "unknown role '{other}' (expected member, admin or blocked)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ListingStatus {
    #[default]
    Active,
    Sold,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ListingStatus::Active),
            "sold" => Ok(ListingStatus::Sold),
            other => Err(format!("unknown listing status '{other}'")),
        }
    }
}

/// Identity of whoever is calling the Bridge, as asserted by the identity
/// provider. Passed explicitly into every call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Caller {
    pub external_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Caller {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn display_name(&self) -> String {
        display_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.email.as_deref().unwrap_or_default(),
        )
    }
}

/// `"first last"` trimmed, or the email when both names are blank.
pub fn display_name(first: Option<&str>, last: Option<&str>, email: &str) -> String {
    let full = format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default());
    let full = full.trim();
    if full.is_empty() {
        email.to_string()
    } else {
        full.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn display_name(&self) -> String {
        display_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            &self.email,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub location: String,
    pub condition: Option<String>,
    pub images: Vec<String>,
    pub contact_number: Option<String>,
    pub status: ListingStatus,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listing annotated with its seller's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingView {
    pub listing: Listing,
    pub seller_name: String,
}

/// Data for creating a listing. Free text is sanitized by the Bridge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub location: String,
    pub condition: Option<String>,
    pub images: Vec<String>,
    pub contact_number: Option<String>,
}

/// Partial listing update. For `condition` and `contact_number` an empty
/// string clears the field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub condition: Option<String>,
    pub images: Option<Vec<String>>,
    pub contact_number: Option<String>,
    pub status: Option<ListingStatus>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Browse filters. Category and location compare case-insensitively and the
/// value `"all"` (or blank) disables them; `search` is a case-insensitive
/// substring match over title and description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
}

impl ListingFilter {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Folded filters with disabled entries removed. The search term is put
    /// in the stored (escaped) form of free text so it can match titles such
    /// as `Men's shoes`.
    pub fn normalized(&self) -> ListingFilter {
        fn exact(v: &Option<String>) -> Option<String> {
            v.as_deref().map(fold).filter(|s| !s.is_empty() && s != "all")
        }
        ListingFilter {
            category: exact(&self.category),
            location: exact(&self.location),
            search: self
                .search
                .as_deref()
                .map(|s| fold(&canonical_escape(s.trim())))
                .filter(|s| !s.is_empty()),
        }
    }

    /// Same predicate the store applies, for local caches.
    pub fn matches(&self, listing: &Listing) -> bool {
        let f = self.normalized();
        if let Some(c) = &f.category {
            if fold(&listing.category) != *c {
                return false;
            }
        }
        if let Some(l) = &f.location {
            if fold(&listing.location) != *l {
                return false;
            }
        }
        if let Some(term) = &f.search {
            if !search_key(&listing.title, &listing.description).contains(term.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub listing_id: Uuid,
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalStats {
    pub total_users: u64,
    pub total_listings: u64,
    pub total_views: i64,
    pub locations_served: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserStats {
    pub items_listed: u64,
    pub items_sold: u64,
    pub total_earnings: Decimal,
    pub likes_given: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarketStats {
    pub global: GlobalStats,
    pub mine: UserStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    fn listing(title: &str, description: &str, category: &str, location: &str) -> Listing {
        let now = Utc::now();
        Listing {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            price: Decimal::new(1000, 2),
            category: category.into(),
            location: location.into(),
            condition: None,
            images: vec![],
            contact_number: None,
            status: ListingStatus::Active,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_parsing_accepts_legacy_name() {
        assert_eq!("member".parse::<Role>(), Ok(Role::Member));
        assert_eq!("user".parse::<Role>(), Ok(Role::Member));
        assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("blocked".parse::<Role>(), Ok(Role::Blocked));
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::Blocked.to_string(), "blocked");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        assert_eq!(display_name(Some("Ada"), Some("Lovelace"), "a@x"), "Ada Lovelace");
        assert_eq!(display_name(Some("Ada"), None, "a@x"), "Ada");
        assert_eq!(display_name(None, Some("  "), "a@x"), "a@x");
        assert_eq!(Caller::new("ext").with_email("c@x").display_name(), "c@x");
    }

    #[test]
    fn filter_normalization_drops_all_and_blank() {
        let f = ListingFilter::default()
            .category("All")
            .location("  ")
            .search(" Lamp ");
        let n = f.normalized();
        assert_eq!(n.category, None);
        assert_eq!(n.location, None);
        assert_eq!(n.search.as_deref(), Some("lamp"));
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let book = listing("Calculus", "Good condition", "Books", "South");
        let phone = listing("Phone", "Barely used lamp-shaped phone", "Electronics", "North");

        let books = ListingFilter::default().category("books");
        assert!(books.matches(&book));
        assert!(!books.matches(&phone));

        let south_books = books.clone().location("SOUTH");
        assert!(south_books.matches(&book));

        let lamp = ListingFilter::default().search("LAMP");
        assert!(lamp.matches(&phone));
        assert!(!lamp.matches(&book));

        assert!(ListingFilter::default().matches(&book));
    }

    #[test]
    fn filter_matches_escaped_text_and_non_ascii_labels() {
        let shoes = listing("Men&#x27;s shoes", "Tom &amp; Jerry print", "Électronique", "Île");
        assert!(ListingFilter::default().search("men's").matches(&shoes));
        assert!(ListingFilter::default().search("TOM & JERRY").matches(&shoes));
        assert!(!ListingFilter::default().search("&").matches(&listing("Tom and Jerry", "", "x", "y")));
        assert!(ListingFilter::default().category("électronique").matches(&shoes));
        assert!(ListingFilter::default().location("ÎLE").matches(&shoes));
    }

    #[test]
    fn empty_patch_detection() {
        assert!(ListingPatch::default().is_empty());
        let p = ListingPatch {
            status: Some(ListingStatus::Sold),
            ..Default::default()
        };
        assert!(!p.is_empty());
    }
}
