use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use crate::domain::inventory::{InventoryTransaction, TransactionType};
use crate::domain::product::Product;
use crate::domain::repositories::{
    ChangeSet, DeliveryRepository, DeliveryWrite, ProductRepository, TransactionQuery,
    TransactionRepository, UnitOfWork,
};

/// Ledger postings collected for one commit
///
/// Each product is loaded once; successive postings against it stack up on
/// the same in-memory copy, so a posting that would take stock below zero is
/// rejected before anything is written.
pub struct LedgerDraft<'a> {
    products: &'a dyn ProductRepository,
    touched: Vec<Product>,
    entries: Vec<InventoryTransaction>,
}

impl<'a> LedgerDraft<'a> {
    pub fn new(products: &'a dyn ProductRepository) -> Self {
        Self {
            products,
            touched: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Loads a product into the draft, returning its working copy
    pub async fn product(&mut self, product_id: Uuid) -> ServiceResult<&Product> {
        let index = self.load(product_id).await?;
        Ok(&self.touched[index])
    }

    async fn load(&mut self, product_id: Uuid) -> ServiceResult<usize> {
        if let Some(index) = self.touched.iter().position(|p| p.id() == product_id) {
            return Ok(index);
        }
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", "id", product_id))?;
        self.touched.push(product);
        Ok(self.touched.len() - 1)
    }

    /// Records one movement and applies it to the product's working copy
    pub async fn post(
        &mut self,
        product_id: Uuid,
        kind: TransactionType,
        quantity: i32,
        user_id: Uuid,
        delivery_id: Option<Uuid>,
        notes: Option<String>,
    ) -> ServiceResult<&InventoryTransaction> {
        let index = self.load(product_id).await?;
        let product = &mut self.touched[index];

        let entry = InventoryTransaction::new(product, kind, quantity, user_id, delivery_id, notes)?;
        product.apply_transaction(&entry).map_err(|e| {
            warn!(sku = %product.sku(), kind = %kind, quantity, "ledger posting rejected: {}", e);
            e
        })?;

        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_change_set(self, delivery: Option<DeliveryWrite>) -> ChangeSet {
        ChangeSet {
            delivery,
            products: self.touched,
            transactions: self.entries,
        }
    }
}

/// Input for a manual ledger entry
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub product_id: Uuid,
    pub kind: TransactionType,
    pub quantity: i32,
    pub delivery_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Append-only inventory ledger; every entry moves a product's stock
pub struct InventoryService {
    products: Arc<dyn ProductRepository>,
    deliveries: Arc<dyn DeliveryRepository>,
    transactions: Arc<dyn TransactionRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl InventoryService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        deliveries: Arc<dyn DeliveryRepository>,
        transactions: Arc<dyn TransactionRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            products,
            deliveries,
            transactions,
            unit_of_work,
        }
    }

    /// Records a transaction on behalf of `user_id` and updates stock with it
    ///
    /// A linked delivery must exist and carry the product.
    pub async fn record(
        &self,
        input: NewTransaction,
        user_id: Uuid,
    ) -> ServiceResult<InventoryTransaction> {
        if let Some(delivery_id) = input.delivery_id {
            self.ensure_delivery_carries(delivery_id, input.product_id)
                .await?;
        }

        let mut draft = LedgerDraft::new(self.products.as_ref());
        let entry = draft
            .post(
                input.product_id,
                input.kind,
                input.quantity,
                user_id,
                input.delivery_id,
                input.notes,
            )
            .await?
            .clone();

        self.unit_of_work.commit(draft.into_change_set(None)).await?;
        info!(
            transaction_id = %entry.id,
            sku = %entry.sku,
            kind = %entry.kind,
            quantity = entry.quantity,
            "inventory transaction recorded"
        );
        Ok(entry)
    }

    async fn ensure_delivery_carries(
        &self,
        delivery_id: Uuid,
        product_id: Uuid,
    ) -> ServiceResult<()> {
        let delivery = self
            .deliveries
            .find_by_id(delivery_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Delivery", "id", delivery_id))?;
        if !delivery.items().iter().any(|item| item.product_id == product_id) {
            warn!(
                delivery_id = %delivery_id,
                product_id = %product_id,
                "ledger entry links a delivery that does not carry the product"
            );
            return Err(ServiceError::field(
                "delivery_id",
                "Delivery does not carry this product",
            ));
        }
        Ok(())
    }

    /// Changes stock by a signed amount, logged as an ADJUSTMENT by `user_id`
    pub async fn adjust_quantity(
        &self,
        product_id: Uuid,
        change: i32,
        user_id: Uuid,
    ) -> ServiceResult<Product> {
        if change == 0 {
            return Err(ServiceError::field(
                "quantity_change",
                "Quantity change must not be zero",
            ));
        }

        let mut draft = LedgerDraft::new(self.products.as_ref());
        draft
            .post(
                product_id,
                TransactionType::Adjustment,
                change,
                user_id,
                None,
                Some("Manual quantity adjustment".to_string()),
            )
            .await?;

        let committed = self.unit_of_work.commit(draft.into_change_set(None)).await?;
        let product = committed
            .products
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Internal("Adjusted product missing from commit".to_string()))?;
        info!(product_id = %product_id, change, quantity = product.quantity(), "quantity adjusted");
        Ok(product)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<InventoryTransaction> {
        self.transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("InventoryTransaction", "id", id))
    }

    pub async fn list(&self, query: &TransactionQuery) -> ServiceResult<Vec<InventoryTransaction>> {
        Ok(self.transactions.find(query).await?)
    }

    /// Entries recorded between `start` and `end`, both inclusive
    pub async fn list_between(
        &self,
        product_id: Option<Uuid>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<InventoryTransaction>> {
        if start > end {
            return Err(ServiceError::BadRequest(
                "start_time must not be after end_time".to_string(),
            ));
        }
        self.list(&TransactionQuery {
            product_id,
            from: Some(start),
            to: Some(end),
            ..Default::default()
        })
        .await
    }
}
