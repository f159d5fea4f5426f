use std::sync::Arc;

use thiserror::Error;

use maison_core::{Clock, DomainError, IdGenerator, SystemClock, UuidIdGenerator};
use maison_infra::seed::{demo_audit_logs, demo_catalog, demo_orders};
use maison_infra::{
    AppConfig, AuditService, CatalogService, InMemoryStore, OrderService, PostgresStore, Store,
    StoreError,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("demo data seeding failed: {0}")]
    Seed(#[from] DomainError),
}

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub catalog: CatalogService,
    pub audit: AuditService,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: OrderService::new(store.clone(), ids.clone(), clock.clone()),
            catalog: CatalogService::new(store.clone(), ids.clone(), clock.clone()),
            audit: AuditService::new(store, ids, clock),
        }
    }

    /// In-memory services with the demo data loaded.
    pub async fn in_memory_seeded() -> Result<Self, StartupError> {
        let services = Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(UuidIdGenerator),
            Arc::new(SystemClock),
        );
        services.seed_demo_data(&SystemClock).await?;
        Ok(services)
    }

    /// Catalog, past orders and audit trail. Each is skipped when its table
    /// already has rows.
    async fn seed_demo_data(&self, clock: &dyn Clock) -> Result<(), StartupError> {
        if self.catalog.seed_if_empty(demo_catalog(clock.now())?).await? == 0 {
            tracing::info!("catalog already populated; seeding skipped");
        }

        let catalog = self.catalog.list_products().await?;
        if self.orders.seed_if_empty(demo_orders(&catalog)?).await? == 0 {
            tracing::info!("orders already present; seeding skipped");
        }
        if self.audit.seed_if_empty(demo_audit_logs()?).await? == 0 {
            tracing::info!("audit trail already present; seeding skipped");
        }
        Ok(())
    }
}

/// Pick the store from configuration, apply the schema, seed if asked.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    let store: Arc<dyn Store> = if config.use_persistent_stores {
        let store = PostgresStore::connect(&config.database_url(), 10).await?;
        store.migrate().await?;
        tracing::info!("using postgres store");
        Arc::new(store)
    } else {
        tracing::warn!("USE_PERSISTENT_STORES not enabled; data is kept in memory only");
        Arc::new(InMemoryStore::new())
    };

    let services = AppServices::new(store, Arc::new(UuidIdGenerator), Arc::new(SystemClock));
    if config.seed_catalog {
        services.seed_demo_data(&SystemClock).await?;
    }
    Ok(services)
}
