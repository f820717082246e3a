use async_trait::async_trait;

use super::errors::RepositoryResult;
use crate::domain::delivery::Delivery;
use crate::domain::inventory::InventoryTransaction;
use crate::domain::product::Product;

/// How the delivery in a change set is written
#[derive(Debug, Clone)]
pub enum DeliveryWrite {
    Insert(Delivery),
    /// Conditional on the version the delivery was read at
    Update(Delivery),
}

/// Everything one business operation writes, committed all-or-nothing
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub delivery: Option<DeliveryWrite>,
    /// Products as read plus in-memory changes; each appears at most once
    pub products: Vec<Product>,
    /// Ledger entries to append
    pub transactions: Vec<InventoryTransaction>,
}

/// Stored state after a successful commit
#[derive(Debug, Clone, Default)]
pub struct Committed {
    pub delivery: Option<Delivery>,
    pub products: Vec<Product>,
}

/// Atomic writer for deliveries, product stock and ledger entries
///
/// Product and delivery updates are conditional on their version; if any
/// check fails nothing is written and `RepositoryError::Conflict` is returned.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn commit(&self, changes: ChangeSet) -> RepositoryResult<Committed>;
}
