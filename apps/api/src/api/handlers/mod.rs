pub mod auth;
pub mod deliveries;
pub mod products;
pub mod transactions;
pub mod users;
