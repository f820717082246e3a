// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod delivery;
pub mod errors;
pub mod inventory;
pub mod product;
pub mod repositories;
pub mod user;
