pub mod tracing_audit;

pub use tracing_audit::TracingAudit;
