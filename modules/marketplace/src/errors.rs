//! Error catalog of the marketplace REST surface.
//!
//! Every [`MarketError`] kind has exactly one entry; handlers never build
//! problem bodies by hand.

use httpkit::{ErrDef, Problem, ProblemResponse};

use crate::contract::error::MarketError;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    marketplace_invalid_input_v1,
    marketplace_forbidden_v1,
    marketplace_not_found_v1,
    marketplace_unavailable_v1,
    marketplace_internal_v1,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 5] = [
        ErrorCode::marketplace_invalid_input_v1,
        ErrorCode::marketplace_forbidden_v1,
        ErrorCode::marketplace_not_found_v1,
        ErrorCode::marketplace_unavailable_v1,
        ErrorCode::marketplace_internal_v1,
    ];

    pub const fn def(&self) -> ErrDef {
        match self {
            ErrorCode::marketplace_invalid_input_v1 => ErrDef {
                status: 400,
                title: "Invalid input",
                code: "marketplace.invalid_input.v1",
            },
            ErrorCode::marketplace_forbidden_v1 => ErrDef {
                status: 403,
                title: "Forbidden",
                code: "marketplace.forbidden.v1",
            },
            ErrorCode::marketplace_not_found_v1 => ErrDef {
                status: 404,
                title: "Not found",
                code: "marketplace.not_found.v1",
            },
            ErrorCode::marketplace_unavailable_v1 => ErrDef {
                status: 503,
                title: "Service unavailable",
                code: "marketplace.unavailable.v1",
            },
            ErrorCode::marketplace_internal_v1 => ErrDef {
                status: 500,
                title: "Internal server error",
                code: "marketplace.internal.v1",
            },
        }
    }

    pub const fn status(&self) -> u16 {
        self.def().status
    }

    pub fn from_code(code: &str) -> Option<ErrorCode> {
        Self::ALL.into_iter().find(|c| c.def().code == code)
    }

    pub fn to_problem(&self, message: impl Into<String>) -> Problem {
        self.def().to_problem(message, None)
    }

    pub fn to_response(
        &self,
        message: impl Into<String>,
        details: Option<String>,
        request_id: Option<String>,
    ) -> ProblemResponse {
        let problem = self.def().to_problem(message, details);
        ProblemResponse(match request_id {
            Some(id) => problem.with_request_id(id),
            None => problem,
        })
    }
}

impl From<&MarketError> for ErrorCode {
    fn from(e: &MarketError) -> Self {
        match e {
            MarketError::InvalidInput { .. } => ErrorCode::marketplace_invalid_input_v1,
            MarketError::Forbidden { .. } => ErrorCode::marketplace_forbidden_v1,
            MarketError::NotFound { .. } => ErrorCode::marketplace_not_found_v1,
            MarketError::Unavailable { .. } => ErrorCode::marketplace_unavailable_v1,
            MarketError::Internal => ErrorCode::marketplace_internal_v1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_kinds() {
        assert_eq!(ErrorCode::marketplace_invalid_input_v1.status(), 400);
        assert_eq!(ErrorCode::marketplace_forbidden_v1.status(), 403);
        assert_eq!(ErrorCode::marketplace_not_found_v1.status(), 404);
        assert_eq!(ErrorCode::marketplace_unavailable_v1.status(), 503);
        assert_eq!(ErrorCode::marketplace_internal_v1.status(), 500);
    }

    #[test]
    fn codes_are_unique_and_resolvable() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_code(code.def().code), Some(code));
        }
        assert_eq!(ErrorCode::from_code("marketplace.nope.v1"), None);
    }

    #[test]
    fn to_response_attaches_request_id() {
        let resp = ErrorCode::marketplace_forbidden_v1.to_response(
            "Account is blocked",
            None,
            Some("rid-1".to_string()),
        );
        assert_eq!(resp.0.status, 403);
        assert_eq!(resp.0.error, "Account is blocked");
        assert_eq!(resp.0.code, "marketplace.forbidden.v1");
        assert_eq!(resp.0.request_id.as_deref(), Some("rid-1"));
    }
}
