use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors; one variant per business rule.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("External user ID is required")]
    MissingExternalId,

    #[error("Account is blocked")]
    AccountBlocked,

    #[error("Only administrators can {action}")]
    AdminRequired { action: &'static str },

    #[error("You can only modify your own listings")]
    NotListingOwner { listing_id: Uuid },

    #[error("Cannot modify your own role")]
    SelfRoleChange,

    #[error("Cannot demote other administrators")]
    AdminRoleChange,

    #[error("Cannot delete your own account")]
    SelfDelete,

    #[error("Cannot delete other administrators")]
    AdminDelete,

    #[error("Listing not found: {id}")]
    ListingNotFound { id: Uuid },

    #[error("User not found: {id}")]
    AccountNotFound { id: Uuid },

    #[error("No account with email {email}")]
    UnknownEmail { email: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn listing_not_found(id: Uuid) -> Self {
        Self::ListingNotFound { id }
    }

    pub fn account_not_found(id: Uuid) -> Self {
        Self::AccountNotFound { id }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Classify a repository failure: lost connections and pool exhaustion
    /// are transient, everything else is an internal fault.
    pub fn from_store(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DbErr>() {
            Some(DbErr::ConnectionAcquire(_)) | Some(DbErr::Conn(_)) => {
                Self::unavailable(format!("{err:#}"))
            }
            _ => Self::database(format!("{err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use sea_orm::{ConnAcquireErr, RuntimeErr};

    #[test]
    fn store_errors_are_classified() {
        let acquire: anyhow::Result<()> =
            Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)).context("find_by_id failed");
        assert!(matches!(
            DomainError::from_store(acquire.unwrap_err()),
            DomainError::StoreUnavailable { .. }
        ));

        let conn: anyhow::Result<()> =
            Err(DbErr::Conn(RuntimeErr::Internal("reset".into()))).context("insert failed");
        assert!(matches!(
            DomainError::from_store(conn.unwrap_err()),
            DomainError::StoreUnavailable { .. }
        ));

        let other: anyhow::Result<()> =
            Err(DbErr::Custom("constraint".into())).context("update failed");
        assert!(matches!(
            DomainError::from_store(other.unwrap_err()),
            DomainError::Database { .. }
        ));
    }

    #[test]
    fn rule_messages_are_precise() {
        assert_eq!(
            DomainError::SelfRoleChange.to_string(),
            "Cannot modify your own role"
        );
        assert_eq!(
            DomainError::validation("title", "is required").to_string(),
            "title: is required"
        );
    }
}
