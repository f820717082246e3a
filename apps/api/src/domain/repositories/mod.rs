// Repository contracts (ports)
// Implementations live in the infrastructure layer

pub mod delivery_repository;
pub mod errors;
pub mod pagination;
pub mod product_repository;
pub mod transaction_repository;
pub mod unit_of_work;
pub mod user_repository;

pub use delivery_repository::{DeliveryQuery, DeliveryRepository};
pub use errors::{RepositoryError, RepositoryResult};
pub use pagination::{Page, PageRequest, SortDirection};
pub use product_repository::{ProductQuery, ProductRepository};
pub use transaction_repository::{TransactionQuery, TransactionRepository};
pub use unit_of_work::{ChangeSet, Committed, DeliveryWrite, UnitOfWork};
pub use user_repository::{UserRepository, UserSortField};
