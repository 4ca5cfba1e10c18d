pub mod http;
pub mod local;

pub use http::HttpMarketplaceClient;
pub use local::LocalMarketplaceClient;
