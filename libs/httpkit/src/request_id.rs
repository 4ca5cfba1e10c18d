use axum::http::{HeaderName, Request};
use axum::{body::Body, middleware::Next, response::Response, Router};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

/// Request id as seen by handlers (`Extension<XRequestId>`).
#[derive(Clone, Debug)]
pub struct XRequestId(pub String);

pub fn header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

fn request_id_of<B>(req: &Request<B>) -> String {
    req.headers()
        .get(header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
        .to_owned()
}

/// Copies the request id into request extensions and the current span.
pub async fn push_req_id_to_extensions(mut req: Request<Body>, next: Next) -> Response {
    let rid = request_id_of(&req);
    tracing::Span::current().record("request_id", tracing::field::display(&rid));
    req.extensions_mut().insert(XRequestId(rid));
    next.run(req).await
}

/// Wrap `router` so every request gets an id (generated unless supplied),
/// a tracing span carrying it, and the id echoed back in the response.
pub fn with_request_tracing(router: Router) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id_of(req),
            status = Empty,
        )
    });

    // Layers run outermost-last: set id → trace span → extensions → handler.
    router
        .layer(axum::middleware::from_fn(push_req_id_to_extensions))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(header()))
        .layer(SetRequestIdLayer::new(header(), MakeReqId))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Extension};
    use tower::ServiceExt;

    async fn echo(Extension(rid): Extension<XRequestId>) -> String {
        rid.0
    }

    #[tokio::test]
    async fn generates_and_echoes_request_id() {
        let app = with_request_tracing(Router::new().route("/echo", get(echo)));
        let resp = app
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let hdr = resp
            .headers()
            .get(header())
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .expect("request id header");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&body), hdr);
        assert_ne!(hdr, "n/a");
    }

    #[tokio::test]
    async fn keeps_client_supplied_id() {
        let app = with_request_tracing(Router::new().route("/echo", get(echo)));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers().get(header()).unwrap(), "abc-123");
    }
}
