pub mod app_config;
pub mod database;
pub mod customer_repo;
pub mod catalog_repo;
pub mod order_repo;
pub mod memory;
pub mod seed;

use std::sync::Arc;

use crm_catalog::ProductRepository;
use crm_core::CustomerRepository;
use crm_order::OrderRepository;
use sqlx::PgPool;
use tracing::info;

pub use app_config::{Config, StorageBackend};
pub use catalog_repo::StoreProductRepository;
pub use customer_repo::StoreCustomerRepository;
pub use database::DbClient;
pub use memory::InMemoryStore;
pub use order_repo::StoreOrderRepository;
pub use seed::{seed_fixtures, SeedSummary};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database connection failed: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Repository handles shared by every workflow.
#[derive(Clone)]
pub struct Repositories {
    pub customers: Arc<dyn CustomerRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            customers: Arc::new(StoreCustomerRepository::new(pool.clone())),
            products: Arc::new(StoreProductRepository::new(pool.clone())),
            orders: Arc::new(StoreOrderRepository::new(pool)),
        }
    }

    /// All three handles share one in-process store.
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            customers: Arc::new(store.clone()),
            products: Arc::new(store.clone()),
            orders: Arc::new(store),
        }
    }

    /// Builds the backend selected by `storage.backend`.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::Postgres => {
                let db = DbClient::new(&config.database).await?;
                if config.database.run_migrations {
                    db.migrate().await?;
                }
                info!("Connected to Postgres");
                Ok(Self::postgres(db.pool))
            }
        }
    }
}
