use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(title = "Problem", description = "Error body of a failed request")]
pub struct Problem {
    /// Short human-readable statement of the violated rule.
    pub error: String,
    /// Occurrence-specific explanation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable code from the error catalog.
    #[serde(default)]
    pub code: String,
    /// HTTP status mirrored into the body.
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            code: String::new(),
            status: status.as_u16(),
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Static catalog entry: status, code and default summary of one error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
}

impl ErrDef {
    /// Build a problem whose `error` is the specific message and whose
    /// `details` carries the optional extra context.
    #[inline]
    pub fn to_problem(&self, message: impl Into<String>, details: Option<String>) -> Problem {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = message.into();
        let problem = Problem::new(
            status,
            if message.is_empty() { self.title.to_string() } else { message },
        )
        .with_code(self.code);
        match details {
            Some(d) => problem.with_details(d),
            None => problem,
        }
    }
}

/// Axum responder that renders a [`Problem`] with its status code.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let mut resp = axum::Json(self.0).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        );
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORBIDDEN: ErrDef = ErrDef {
        status: 403,
        title: "Forbidden",
        code: "market.forbidden",
    };

    #[test]
    fn response_carries_status() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Missing required fields");
        let resp = ProblemResponse(p).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn err_def_uses_specific_message() {
        let p = FORBIDDEN.to_problem("Cannot demote other administrators", None);
        assert_eq!(p.status, 403);
        assert_eq!(p.code, "market.forbidden");
        assert_eq!(p.error, "Cannot demote other administrators");
        assert!(p.details.is_none());
    }

    #[test]
    fn err_def_falls_back_to_title() {
        let p = FORBIDDEN.to_problem("", Some("ctx".into()));
        assert_eq!(p.error, "Forbidden");
        assert_eq!(p.details.as_deref(), Some("ctx"));
    }

    #[test]
    fn serialized_shape_omits_empty_optionals() {
        let p = Problem::new(StatusCode::NOT_FOUND, "Listing not found").with_code("x");
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["error"], "Listing not found");
        assert_eq!(v["status"], 404);
        assert!(v.get("details").is_none());
        assert!(v.get("requestId").is_none());

        let p = p.with_request_id("r1");
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["requestId"], "r1");
    }
}
