// Delivery domain module
// Contains the delivery aggregate, its embedded items and status machine

#![allow(clippy::module_inception)]

pub mod delivery;
pub mod value_objects;

pub use delivery::{Delivery, DeliveryItem, ItemFlags, NewDelivery};
pub use value_objects::{DeliveryPriority, DeliveryStatus};
