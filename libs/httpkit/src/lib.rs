//! HTTP plumbing shared by the marketplace REST adapter, its HTTP gateway and
//! the server binary.

pub mod client;
pub mod problem;
pub mod request_id;

pub use client::TracedClient;
pub use problem::{ErrDef, Problem, ProblemResponse};
