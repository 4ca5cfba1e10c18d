use std::sync::Arc;

use arc_swap::ArcSwapOption;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::MarketplaceConfig;
use crate::contract::client::MarketplaceApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::LocalMarketplaceClient;
use crate::infra::audit::TracingAudit;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmMarketRepository;

/// Wires storage, audit and the Bridge service together and hands out the
/// REST routes and in-process client.
#[derive(Default)]
pub struct Marketplace {
    // Read-mostly: stored once by `init`, read by every route registration and client.
    service: ArcSwapOption<Service>,
    config: MarketplaceConfig,
}

impl Clone for Marketplace {
    fn clone(&self) -> Self {
        Self {
            service: ArcSwapOption::new(self.service.load_full()),
            config: self.config.clone(),
        }
    }
}

impl Marketplace {
    pub fn new(config: MarketplaceConfig) -> Self {
        Self {
            service: ArcSwapOption::empty(),
            config,
        }
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    pub fn init(&self, db: DatabaseConnection) {
        info!("Initializing marketplace module");
        debug!(
            bootstrap_admins = self.config.bootstrap_admins.len(),
            max_images = self.config.max_images,
            "Loaded marketplace config"
        );

        let repo = Arc::new(SeaOrmMarketRepository::new(db));
        let service = Service::new(
            repo.clone(),
            repo.clone(),
            repo,
            Arc::new(TracingAudit),
            ServiceConfig::from(&self.config),
        );
        self.service.store(Some(Arc::new(service)));
    }

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running marketplace database migrations");
        Migrator::up(db, None).await?;
        info!("Marketplace database migrations completed");
        Ok(())
    }

    pub fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process implementation of the client contract.
    pub fn client(&self) -> anyhow::Result<Arc<dyn MarketplaceApi>> {
        Ok(Arc::new(LocalMarketplaceClient::new(self.service()?)))
    }

    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering marketplace REST routes");
        let router = routes::register_routes(router, self.service()?, self.config.enable_docs)?;
        Ok(router)
    }
}
