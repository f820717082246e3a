//! DlVery API Library
//!
//! Delivery and inventory backend: users and roles, the product catalogue,
//! delivery assignment with its status lifecycle, and the inventory ledger
//! that keeps stock levels in step with both.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod state;
