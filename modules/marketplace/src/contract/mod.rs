pub mod client;
pub mod error;
pub mod model;
pub mod text;

pub use client::MarketplaceApi;
pub use error::MarketError;
pub use model::*;
