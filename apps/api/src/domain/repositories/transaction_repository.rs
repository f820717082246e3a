use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::inventory::{InventoryTransaction, TransactionType};

/// Filter for ledger queries; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    pub product_id: Option<Uuid>,
    pub sku: Option<String>,
    pub kind: Option<TransactionType>,
    pub user_id: Option<Uuid>,
    pub delivery_id: Option<Uuid>,
    /// Recorded at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Recorded at or before this instant
    pub to: Option<DateTime<Utc>>,
}

impl TransactionQuery {
    pub fn matches(&self, tx: &InventoryTransaction) -> bool {
        self.product_id.map_or(true, |p| tx.product_id == p)
            && self.sku.as_deref().map_or(true, |s| tx.sku == s)
            && self.kind.map_or(true, |k| tx.kind == k)
            && self.user_id.map_or(true, |u| tx.user_id == u)
            && self.delivery_id.map_or(true, |d| tx.delivery_id == Some(d))
            && self.from.map_or(true, |from| tx.timestamp >= from)
            && self.to.map_or(true, |to| tx.timestamp <= to)
    }
}

/// Read side of the inventory ledger
///
/// Entries are appended through [`super::UnitOfWork`] together with the
/// product change they cause.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<InventoryTransaction>>;

    /// Entries matching `query`, newest first
    async fn find(&self, query: &TransactionQuery) -> RepositoryResult<Vec<InventoryTransaction>>;
}
