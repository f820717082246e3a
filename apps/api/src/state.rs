use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::google::GoogleIdentityProvider;
use crate::config::Config;
use crate::domain::repositories::{
    DeliveryRepository, ProductRepository, TransactionRepository, UnitOfWork, UserRepository,
};
use crate::infrastructure::cache::UserCache;
use crate::infrastructure::repositories::{
    InMemoryStore, PostgresDeliveryRepository, PostgresProductRepository,
    PostgresTransactionRepository, PostgresUnitOfWork, PostgresUserRepository,
};
use crate::services::{AuthSettings, DeliveryService, InventoryService, ProductService, UserService};

/// Repository ports the services are wired against
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub deliveries: Arc<dyn DeliveryRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            products: Arc::new(PostgresProductRepository::new(pool.clone())),
            deliveries: Arc::new(PostgresDeliveryRepository::new(pool.clone())),
            transactions: Arc::new(PostgresTransactionRepository::new(pool.clone())),
            unit_of_work: Arc::new(PostgresUnitOfWork::new(pool)),
        }
    }

    /// Every port backed by one shared in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            products: store.clone(),
            deliveries: store.clone(),
            transactions: store.clone(),
            unit_of_work: store,
        }
    }
}

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<UserService>,
    pub products: Arc<ProductService>,
    pub inventory: Arc<InventoryService>,
    pub deliveries: Arc<DeliveryService>,
}

impl AppState {
    pub fn new(
        config: Config,
        repositories: Repositories,
        google: Arc<dyn GoogleIdentityProvider>,
    ) -> Self {
        let users = Arc::new(UserService::new(
            repositories.users,
            UserCache::new(config.user_cache_ttl),
            google,
            AuthSettings {
                jwt_secret: config.jwt_secret.clone(),
                jwt_expiry_hours: config.jwt_expiry_hours,
                bcrypt_cost: config.bcrypt_cost,
            },
        ));
        let products = Arc::new(ProductService::new(repositories.products.clone()));
        let inventory = Arc::new(InventoryService::new(
            repositories.products.clone(),
            repositories.deliveries.clone(),
            repositories.transactions,
            repositories.unit_of_work.clone(),
        ));
        let deliveries = Arc::new(DeliveryService::new(
            repositories.deliveries,
            repositories.products,
            users.clone(),
            repositories.unit_of_work,
        ));

        Self {
            config: Arc::new(config),
            users,
            products,
            inventory,
            deliveries,
        }
    }
}
