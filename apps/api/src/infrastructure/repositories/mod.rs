// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory;
pub mod postgres_delivery_repository;
pub mod postgres_product_repository;
pub mod postgres_transaction_repository;
pub mod postgres_unit_of_work;
pub mod postgres_user_repository;
mod sqlx_errors;

pub use in_memory::InMemoryStore;
pub use postgres_delivery_repository::PostgresDeliveryRepository;
pub use postgres_product_repository::PostgresProductRepository;
pub use postgres_transaction_repository::PostgresTransactionRepository;
pub use postgres_unit_of_work::PostgresUnitOfWork;
pub use postgres_user_repository::PostgresUserRepository;
