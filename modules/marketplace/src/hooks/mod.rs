//! Client-side state holders built on [`MarketplaceApi`](crate::client::MarketplaceApi).
//! They cache results, bound every call with a timeout and retry reads once.

pub mod contact;
pub mod likes;
pub mod listings;
pub mod policy;
pub mod session;

pub use contact::{inquiry_message, listing_contact_link, whatsapp_link};
pub use likes::LikesHook;
pub use listings::{ListingScope, ListingsHook};
pub use policy::{CallPolicy, FetchState};
pub use session::{IdentityState, SessionHook, SessionSnapshot};
