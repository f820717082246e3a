use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::delivery::{Delivery, DeliveryStatus};

/// Filter for delivery listings; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryQuery {
    pub agent_id: Option<Uuid>,
    pub status: Option<DeliveryStatus>,
    /// Scheduled on or after this day
    pub scheduled_from: Option<NaiveDate>,
    /// Scheduled on or before this day
    pub scheduled_to: Option<NaiveDate>,
    /// Carries an item with this SKU
    pub item_sku: Option<String>,
    /// Only deliveries with at least one damaged item
    pub damaged_items_only: bool,
}

impl DeliveryQuery {
    pub fn matches(&self, delivery: &Delivery) -> bool {
        self.agent_id.map_or(true, |a| delivery.delivery_agent_id() == a)
            && self.status.map_or(true, |s| delivery.status() == s)
            && self.scheduled_from.map_or(true, |d| delivery.scheduled_date() >= d)
            && self.scheduled_to.map_or(true, |d| delivery.scheduled_date() <= d)
            && self
                .item_sku
                .as_deref()
                .map_or(true, |sku| delivery.items().iter().any(|i| i.sku == sku))
            && (!self.damaged_items_only || delivery.has_damaged_items())
    }
}

/// Read side of delivery persistence
///
/// Deliveries are written through [`super::UnitOfWork`] so that a delivery
/// and the ledger entries it causes are stored together.
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Delivery>>;

    /// Deliveries matching `query`, newest first
    async fn find(&self, query: &DeliveryQuery) -> RepositoryResult<Vec<Delivery>>;
}
