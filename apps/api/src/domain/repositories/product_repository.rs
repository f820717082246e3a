use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::product::{Product, ProductCategory};

/// Filter for product listings; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub category: Option<ProductCategory>,
    pub damaged: Option<bool>,
    pub perishable: Option<bool>,
    /// Expiry date on or after this day
    pub expires_on_or_after: Option<NaiveDate>,
    /// Expiry date strictly before this day
    pub expires_before: Option<NaiveDate>,
}

impl ProductQuery {
    pub fn matches(&self, product: &Product) -> bool {
        self.category.map_or(true, |c| product.category() == c)
            && self.damaged.map_or(true, |d| product.is_damaged() == d)
            && self.perishable.map_or(true, |p| product.is_perishable() == p)
            && self
                .expires_on_or_after
                .map_or(true, |from| product.expiry_date().is_some_and(|e| e >= from))
            && self
                .expires_before
                .map_or(true, |to| product.expiry_date().is_some_and(|e| e < to))
    }
}

/// Repository trait for Product aggregates
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product; fails with `Duplicate` on SKU clash
    async fn create(&self, product: &Product) -> RepositoryResult<()>;

    /// Write back a product read earlier; fails with `Conflict` if it changed
    /// in the meantime. Returns the stored product with its new version.
    async fn update(&self, product: &Product) -> RepositoryResult<Product>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Product>>;

    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>>;

    async fn exists_by_sku(&self, sku: &str) -> RepositoryResult<bool>;

    /// Products matching `query`, ordered by SKU
    async fn find(&self, query: &ProductQuery) -> RepositoryResult<Vec<Product>>;
}
