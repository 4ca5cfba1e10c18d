use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::ports::{AuditEntry, AuditPort};

pub const AUDIT_TARGET: &str = "marketplace::audit";

/// Writes each audit entry as a structured event on the `marketplace::audit`
/// target, so it can be routed to its own log file.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

#[async_trait]
impl AuditPort for TracingAudit {
    async fn record(&self, entry: AuditEntry) -> Result<(), DomainError> {
        let actor = entry.actor.map(|id| id.to_string());
        let target = entry.target.map(|id| id.to_string());
        tracing::info!(
            target: AUDIT_TARGET,
            action = entry.action,
            actor = actor.as_deref().unwrap_or("operator"),
            record = target.as_deref().unwrap_or("-"),
            detail = entry.detail.as_deref().unwrap_or(""),
            "audit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use uuid::Uuid;

    #[tokio::test]
    #[traced_test]
    async fn writes_structured_event() {
        let listing = Uuid::new_v4();
        TracingAudit
            .record(AuditEntry::new(None, "listing.delete").target(listing))
            .await
            .unwrap();
        assert!(logs_contain("listing.delete"));
        assert!(logs_contain(&listing.to_string()));
        assert!(logs_contain("operator"));
    }
}
