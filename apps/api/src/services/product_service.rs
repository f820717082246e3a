use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::info;
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use crate::domain::product::{Product, ProductCategory, ProductDetails};
use crate::domain::repositories::{ProductQuery, ProductRepository};

/// Product catalogue keyed by SKU
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub async fn create(&self, sku: String, details: ProductDetails) -> ServiceResult<Product> {
        let product = Product::new(sku, details)?;
        if self.products.exists_by_sku(product.sku()).await? {
            return Err(ServiceError::field("sku", "SKU already exists"));
        }
        self.products.create(&product).await?;
        info!(product_id = %product.id(), sku = %product.sku(), "product created");
        Ok(product)
    }

    /// Replaces every mutable field; the SKU never changes
    pub async fn update(&self, id: Uuid, details: ProductDetails) -> ServiceResult<Product> {
        let mut product = self.get(id).await?;
        product.update(details)?;
        let stored = self.products.update(&product).await?;
        info!(product_id = %id, version = stored.version(), "product updated");
        Ok(stored)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", "id", id))
    }

    pub async fn get_by_sku(&self, sku: &str) -> ServiceResult<Product> {
        self.products
            .find_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", "sku", sku))
    }

    pub async fn list(&self, query: &ProductQuery) -> ServiceResult<Vec<Product>> {
        Ok(self.products.find(query).await?)
    }

    pub async fn by_category(&self, category: ProductCategory) -> ServiceResult<Vec<Product>> {
        self.list(&ProductQuery {
            category: Some(category),
            ..Default::default()
        })
        .await
    }

    pub async fn damaged(&self) -> ServiceResult<Vec<Product>> {
        self.list(&ProductQuery {
            damaged: Some(true),
            ..Default::default()
        })
        .await
    }

    pub async fn perishable(&self) -> ServiceResult<Vec<Product>> {
        self.list(&ProductQuery {
            perishable: Some(true),
            ..Default::default()
        })
        .await
    }

    /// Products whose expiry date falls strictly before `date`
    pub async fn expiring_before(&self, date: NaiveDate) -> ServiceResult<Vec<Product>> {
        self.list(&ProductQuery {
            expires_before: Some(date),
            ..Default::default()
        })
        .await
    }

    /// Products expiring between `start` and `end`, both days included
    pub async fn expiring_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<Vec<Product>> {
        if start > end {
            return Err(ServiceError::BadRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }
        self.list(&ProductQuery {
            expires_on_or_after: Some(start),
            expires_before: end.checked_add_days(Days::new(1)),
            ..Default::default()
        })
        .await
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.products.delete(id).await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }
}
