pub mod audit;

pub use audit::{AuditEntry, AuditPort};
