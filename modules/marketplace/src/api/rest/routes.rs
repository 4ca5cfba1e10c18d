use std::sync::Arc;

use axum::{routing::get, routing::post, Extension, Json, Router};

use crate::api::rest::{handlers, openapi};
use crate::domain::service::Service;

pub fn register_routes(
    mut router: Router,
    service: Arc<Service>,
    enable_docs: bool,
) -> anyhow::Result<Router> {
    // POST /bridge - every marketplace action
    router = router.route(
        "/bridge",
        post(handlers::bridge).layer(Extension(service)),
    );

    // GET /openapi.json - generated schema
    if enable_docs {
        let doc = openapi::document();
        router = router.route(
            "/openapi.json",
            get(move || {
                let doc = doc.clone();
                async move { Json(doc) }
            }),
        );
    }

    Ok(router)
}
