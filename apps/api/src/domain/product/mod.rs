// Product domain module
// Contains the product aggregate and its category value object

#![allow(clippy::module_inception)]

pub mod product;
pub mod value_objects;

pub use product::{Product, ProductDetails};
pub use value_objects::ProductCategory;
