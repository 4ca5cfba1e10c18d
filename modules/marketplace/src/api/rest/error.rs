use httpkit::ProblemResponse;

use crate::contract::error::MarketError;
use crate::domain::error::DomainError;
use crate::errors::ErrorCode;

/// Render a contract error through the catalog. Internal details never leave
/// the process; they are logged instead.
pub fn problem_for(e: &MarketError, request_id: Option<String>) -> ProblemResponse {
    let code = ErrorCode::from(e);
    match e {
        MarketError::Internal => {
            code.to_response("Internal server error", None, request_id)
        }
        MarketError::Unavailable { message } => {
            tracing::warn!(error = %message, "Store unavailable");
            code.to_response("Service temporarily unavailable", Some(message.clone()), request_id)
        }
        other => code.to_response(other.message(), None, request_id),
    }
}

/// Convert a domain error for the outside world, logging what gets hidden.
pub fn from_domain(e: DomainError) -> MarketError {
    if matches!(e, DomainError::Database { .. }) {
        tracing::error!(error = %e, "Database error occurred");
    }
    MarketError::from(e)
}

/// Malformed envelope or payload.
pub fn invalid_input(
    message: impl Into<String>,
    details: Option<String>,
    request_id: Option<String>,
) -> ProblemResponse {
    ErrorCode::marketplace_invalid_input_v1.to_response(message, details, request_id)
}
