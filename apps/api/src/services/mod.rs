// Application services
// Orchestrate domain objects and repository ports; handlers only talk to these

pub mod delivery_service;
pub mod errors;
pub mod inventory_service;
pub mod product_service;
pub mod user_service;

pub use delivery_service::{Assignment, DeliveryService, ItemRequest};
pub use errors::{ServiceError, ServiceResult};
pub use inventory_service::{InventoryService, LedgerDraft, NewTransaction};
pub use product_service::ProductService;
pub use user_service::{AuthSettings, ProfileUpdate, Registration, Session, UserService};
