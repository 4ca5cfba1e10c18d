use httpkit::TracedClient;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use marketplace::{
    contract::{client::MarketplaceApi, error::MarketError, model::{Caller, Role}},
    gateways::HttpMarketplaceClient,
};

fn client_for(server: &MockServer) -> HttpMarketplaceClient {
    let base = Url::parse(&server.base_url()).expect("mock url");
    HttpMarketplaceClient::new(TracedClient::default(), &base).expect("endpoint")
}

fn caller() -> Caller {
    Caller::new("ext-1")
        .with_email("ada@campus.edu")
        .with_name("Ada", "Lovelace")
}

#[tokio::test]
async fn sends_envelope_with_claims() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(POST)
            .path("/bridge")
            .header_exists("x-request-id")
            .json_body(json!({
                "externalId": "ext-1",
                "action": "getRole",
                "payload": { "email": "ada@campus.edu", "firstName": "Ada", "lastName": "Lovelace" }
            }));
        then.status(200).json_body(json!({ "role": "admin" }));
    });

    let role = client_for(&server).get_role(&caller()).await.unwrap();
    assert_eq!(role, Role::Admin);
    m.assert();
}

#[tokio::test]
async fn catalog_problems_become_contract_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/bridge");
        then.status(403).json_body(json!({
            "error": "Only administrators can delete users",
            "code": "marketplace.forbidden.v1",
            "status": 403
        }));
    });

    let err = client_for(&server)
        .delete_user(&caller(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err, MarketError::forbidden("Only administrators can delete users"));
}

#[tokio::test]
async fn store_outage_is_retryable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/bridge");
        then.status(503).json_body(json!({
            "error": "Service temporarily unavailable",
            "details": "pool timed out",
            "code": "marketplace.unavailable.v1",
            "status": 503
        }));
    });

    let err = client_for(&server).get_stats(&caller()).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err, MarketError::unavailable("pool timed out"));
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let base = Url::parse("http://127.0.0.1:9/").expect("url");
    let client = HttpMarketplaceClient::new(
        TracedClient::with_timeout(std::time::Duration::from_millis(200)).expect("client"),
        &base,
    )
    .expect("endpoint");
    let err = client.get_likes(&caller()).await.unwrap_err();
    assert!(err.is_retryable());
}
