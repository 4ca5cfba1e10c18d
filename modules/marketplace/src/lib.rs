// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::{client, error, model};

// === ERROR CATALOG ===
pub mod errors;

// === MODULE DEFINITION ===
pub mod module;
pub use module::Marketplace;

// === CLIENT HOOKS ===
pub mod hooks;

// === INTERNAL MODULES ===
// Exposed for tests and the server binary; consumers should stay on `contract`,
// `gateways` and `hooks`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
pub mod gateways;
#[doc(hidden)]
pub mod infra;
