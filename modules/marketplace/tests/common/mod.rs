#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use marketplace::{
    config::MarketplaceConfig,
    contract::{
        client::MarketplaceApi,
        model::{Caller, NewListing},
    },
    domain::service::{Service, ServiceConfig},
    gateways::LocalMarketplaceClient,
    infra::{audit::TracingAudit, storage::migrations::Migrator, storage::sea_orm_repo::SeaOrmMarketRepository},
};

pub const ADMIN_EMAIL: &str = "admin@campus.edu";

/// Fresh in-memory database with the schema applied.
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn create_test_service() -> Arc<Service> {
    create_test_service_with(MarketplaceConfig {
        bootstrap_admins: vec![ADMIN_EMAIL.to_string()],
        ..Default::default()
    })
    .await
}

pub async fn create_test_service_with(cfg: MarketplaceConfig) -> Arc<Service> {
    let db = create_test_db().await;
    let repo = Arc::new(SeaOrmMarketRepository::new(db));
    Arc::new(Service::new(
        repo.clone(),
        repo.clone(),
        repo,
        Arc::new(TracingAudit),
        ServiceConfig::from(&cfg),
    ))
}

pub async fn create_test_client() -> Arc<dyn MarketplaceApi> {
    Arc::new(LocalMarketplaceClient::new(create_test_service().await))
}

pub fn admin() -> Caller {
    Caller::new("ext-admin")
        .with_email(ADMIN_EMAIL)
        .with_name("Grace", "Hopper")
}

pub fn member(n: u32) -> Caller {
    Caller::new(format!("ext-member-{n}"))
        .with_email(format!("member{n}@campus.edu"))
        .with_name("Member", format!("No{n}"))
}

pub fn new_listing(title: &str) -> NewListing {
    NewListing {
        title: title.to_string(),
        description: format!("{title} in good shape"),
        price: Decimal::new(2500, 2),
        category: "Books".to_string(),
        location: "North Campus".to_string(),
        condition: Some("Used".to_string()),
        images: vec!["https://img.example.com/1.png".to_string()],
        contact_number: Some("+1 415 555 2671".to_string()),
    }
}
