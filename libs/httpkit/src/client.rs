//! `reqwest` wrapper that runs every outgoing request inside a tracing span
//! and tags it with a fresh `x-request-id`.

use serde::Serialize;
use std::time::Duration;
use tracing::{field::Empty, Instrument, Level};

use crate::request_id::header;

#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Client with a whole-request timeout.
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner })
    }

    pub async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let rid = nanoid::nanoid!();
        if let Ok(v) = rid.parse::<reqwest::header::HeaderValue>() {
            req.headers_mut().entry(header()).or_insert(v);
        }

        let span = tracing::span!(
            Level::INFO,
            "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            request_id = %rid,
            http.status_code = Empty,
        );

        async {
            let result = self.inner.execute(req).await;
            match &result {
                Ok(resp) => {
                    tracing::Span::current().record("http.status_code", resp.status().as_u16());
                    if resp.status().is_server_error() {
                        tracing::warn!(status = resp.status().as_u16(), "upstream error");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "request failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.post(url).json(body).build()?;
        self.execute(req).await
    }

    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.get(url).build()?;
        self.execute(req).await
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

impl From<reqwest::Client> for TracedClient {
    fn from(c: reqwest::Client) -> Self {
        Self::new(c)
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn tags_requests_with_request_id() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/bridge")
                .header_exists("x-request-id")
                .json_body(serde_json::json!({ "ping": true }));
            then.status(200).body("ok");
        });

        let client = TracedClient::default();
        let resp = client
            .post_json(&server.url("/bridge"), &serde_json::json!({ "ping": true }))
            .await
            .unwrap();

        assert!(resp.status().is_success());
        m.assert();
    }

    #[tokio::test]
    async fn connection_errors_surface_as_reqwest_errors() {
        let client = TracedClient::with_timeout(Duration::from_millis(200)).unwrap();
        // Port 9 (discard) is closed on test machines.
        let err = client.get("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.is_connect() || err.is_timeout());
    }
}
