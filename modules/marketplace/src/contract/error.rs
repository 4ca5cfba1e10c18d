use thiserror::Error;

/// Errors that are safe to expose to callers of the Bridge.
///
/// Every message names the rule that was violated so the caller can correct
/// the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("{message}")]
    InvalidInput { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    NotFound { message: String },

    /// Store or transport unreachable, or the call timed out. Retryable.
    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Internal error")]
    Internal,
}

impl MarketError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    /// Only transient failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput { message }
            | Self::Forbidden { message }
            | Self::NotFound { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<crate::domain::error::DomainError> for MarketError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        let message = domain_error.to_string();
        match domain_error {
            Validation { .. } | MissingExternalId => Self::invalid_input(message),
            AccountBlocked
            | AdminRequired { .. }
            | NotListingOwner { .. }
            | SelfRoleChange
            | AdminRoleChange
            | SelfDelete
            | AdminDelete => Self::forbidden(message),
            ListingNotFound { .. } | AccountNotFound { .. } | UnknownEmail { .. } => {
                Self::not_found(message)
            }
            StoreUnavailable { .. } => Self::unavailable(message),
            Database { .. } => Self::internal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use uuid::Uuid;

    #[test]
    fn domain_errors_map_to_kinds() {
        assert!(matches!(
            MarketError::from(DomainError::validation("price", "must not be negative")),
            MarketError::InvalidInput { .. }
        ));
        assert_eq!(
            MarketError::from(DomainError::AdminRoleChange),
            MarketError::forbidden("Cannot demote other administrators")
        );
        assert!(matches!(
            MarketError::from(DomainError::listing_not_found(Uuid::nil())),
            MarketError::NotFound { .. }
        ));
        assert!(MarketError::from(DomainError::unavailable("pool timed out")).is_retryable());
        assert_eq!(
            MarketError::from(DomainError::database("syntax error")),
            MarketError::Internal
        );
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(MarketError::unavailable("x").is_retryable());
        assert!(!MarketError::forbidden("x").is_retryable());
        assert!(!MarketError::invalid_input("x").is_retryable());
        assert!(!MarketError::not_found("x").is_retryable());
        assert!(!MarketError::internal().is_retryable());
    }

    #[test]
    fn message_keeps_rule_text() {
        assert_eq!(
            MarketError::forbidden("Cannot modify your own role").message(),
            "Cannot modify your own role"
        );
        assert_eq!(MarketError::internal().message(), "Internal error");
    }
}
