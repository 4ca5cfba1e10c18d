use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// One mutating action: who did what to which record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Account id of the actor; `None` for operator commands.
    pub actor: Option<Uuid>,
    pub action: &'static str,
    pub target: Option<Uuid>,
    pub detail: Option<String>,
}

impl AuditEntry {
    pub fn new(actor: Option<Uuid>, action: &'static str) -> Self {
        Self {
            actor,
            action,
            target: None,
            detail: None,
        }
    }

    pub fn target(mut self, id: Uuid) -> Self {
        self.target = Some(id);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Transport-agnostic audit sink. Failures are reported but never fail the
/// action being audited.
#[async_trait]
pub trait AuditPort: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), DomainError>;
}
