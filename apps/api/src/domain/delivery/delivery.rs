use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{DeliveryPriority, DeliveryStatus};
use crate::domain::errors::{DomainError, DomainResult, Violations};
use crate::domain::product::Product;
use crate::domain::user::value_objects::validate_phone_number;

/// A product line carried by a delivery
///
/// SKU and name are copied from the product at assignment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryItem {
    pub product_id: Uuid,
    pub sku: String,
    pub product_name: String,
    pub quantity: i32,
    pub damaged: bool,
    pub returned: bool,
}

impl DeliveryItem {
    pub fn new(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: product.id(),
            sku: product.sku().to_string(),
            product_name: product.name().to_string(),
            quantity,
            damaged: false,
            returned: false,
        }
    }

    /// Item comes back into the warehouse when the delivery closes
    pub fn needs_restock(&self) -> bool {
        self.damaged || self.returned
    }
}

/// Damage/return flags reported by the agent for one SKU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFlags {
    pub sku: String,
    pub damaged: bool,
    pub returned: bool,
}

/// Input for assigning a new delivery
#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub delivery_agent_id: Uuid,
    pub items: Vec<DeliveryItem>,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub priority: Option<DeliveryPriority>,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Delivery aggregate root
///
/// # Invariants
/// - Carries at least one item, each with a positive quantity
/// - Starts as Pending (or InTransit when requested)
/// - Status only moves along [`DeliveryStatus::can_transition_to`]
/// - `delivered_at` is set exactly once, on entering Delivered
#[derive(Debug, Clone)]
pub struct Delivery {
    id: Uuid,
    delivery_agent_id: Uuid,
    items: Vec<DeliveryItem>,
    customer_name: String,
    customer_address: String,
    customer_phone: Option<String>,
    status: DeliveryStatus,
    priority: DeliveryPriority,
    scheduled_date: NaiveDate,
    delivered_at: Option<DateTime<Utc>>,
    customer_signature: Option<String>,
    notes: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Delivery {
    /// Creates a delivery in its initial status
    ///
    /// The scheduled date defaults to the creation day.
    pub fn new(input: NewDelivery) -> DomainResult<Self> {
        let mut violations = Violations::new();
        violations.check(!input.items.is_empty(), "items", "At least one item is required");
        for (index, item) in input.items.iter().enumerate() {
            violations.check(
                item.quantity > 0,
                &format!("items[{}].quantity", index),
                "Quantity must be greater than zero",
            );
        }
        violations.check(
            !input.customer_name.trim().is_empty(),
            "customer_name",
            "Customer name is required",
        );
        violations.check(
            !input.customer_address.trim().is_empty(),
            "customer_address",
            "Customer address is required",
        );
        if let Some(phone) = &input.customer_phone {
            if let Err(message) = validate_phone_number(phone) {
                violations.add("customer_phone", message);
            }
        }
        let status = input.status.unwrap_or(DeliveryStatus::Pending);
        violations.check(
            matches!(status, DeliveryStatus::Pending | DeliveryStatus::InTransit),
            "status",
            "A new delivery must start as PENDING or IN_TRANSIT",
        );
        violations.into_result()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            delivery_agent_id: input.delivery_agent_id,
            items: input.items,
            customer_name: input.customer_name.trim().to_string(),
            customer_address: input.customer_address.trim().to_string(),
            customer_phone: input.customer_phone,
            status,
            priority: input.priority.unwrap_or_default(),
            scheduled_date: input.scheduled_date.unwrap_or_else(|| now.date_naive()),
            delivered_at: None,
            customer_signature: None,
            notes: input.notes,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fails unless `agent_id` is the agent this delivery is assigned to
    pub fn ensure_assigned_to(&self, agent_id: Uuid) -> DomainResult<()> {
        if self.delivery_agent_id == agent_id {
            Ok(())
        } else {
            Err(DomainError::NotAssignedAgent {
                delivery_id: self.id,
                agent_id,
            })
        }
    }

    /// Moves the delivery to `next`
    ///
    /// Notes replace the current notes only when given. Entering Delivered
    /// stamps `delivered_at`.
    pub fn transition_to(&mut self, next: DeliveryStatus, notes: Option<String>) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }

        let now = Utc::now();
        self.status = next;
        if notes.is_some() {
            self.notes = notes;
        }
        if next == DeliveryStatus::Delivered {
            self.delivered_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Records the customer's acceptance and marks the delivery Delivered
    pub fn complete(&mut self, customer_name: String, customer_signature: String) -> DomainResult<()> {
        let mut violations = Violations::new();
        violations.check(
            !customer_name.trim().is_empty(),
            "customer_name",
            "Customer name is required",
        );
        violations.check(
            !customer_signature.trim().is_empty(),
            "customer_signature",
            "Customer signature is required",
        );
        violations.into_result()?;

        self.transition_to(DeliveryStatus::Delivered, None)?;
        self.customer_name = customer_name.trim().to_string();
        self.customer_signature = Some(customer_signature);
        Ok(())
    }

    /// Applies the agent's damage/return flags to matching items
    ///
    /// Item set and quantities are fixed at assignment; only flags change,
    /// and only while the delivery is still open.
    pub fn flag_items(&mut self, flags: &[ItemFlags]) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidOperation(format!(
                "Items cannot be changed once the delivery is {}",
                self.status
            )));
        }

        let mut violations = Violations::new();
        for (index, flag) in flags.iter().enumerate() {
            violations.check(
                self.items.iter().any(|item| item.sku == flag.sku),
                &format!("items[{}].sku", index),
                "SKU is not part of this delivery",
            );
        }
        violations.into_result()?;

        for flag in flags {
            for item in self.items.iter_mut().filter(|item| item.sku == flag.sku) {
                item.damaged = flag.damaged;
                item.returned = flag.returned;
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Items flagged damaged or returned
    pub fn restock_items(&self) -> impl Iterator<Item = &DeliveryItem> {
        self.items.iter().filter(|item| item.needs_restock())
    }

    pub fn has_damaged_items(&self) -> bool {
        self.items.iter().any(|item| item.damaged)
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn delivery_agent_id(&self) -> Uuid {
        self.delivery_agent_id
    }

    pub fn items(&self) -> &[DeliveryItem] {
        &self.items
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_address(&self) -> &str {
        &self.customer_address
    }

    pub fn customer_phone(&self) -> Option<&str> {
        self.customer_phone.as_deref()
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn priority(&self) -> DeliveryPriority {
        self.priority
    }

    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn customer_signature(&self) -> Option<&str> {
        self.customer_signature.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Delivery from persistence layer data
    ///
    /// Bypasses validation; only for repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        delivery_agent_id: Uuid,
        items: Vec<DeliveryItem>,
        customer_name: String,
        customer_address: String,
        customer_phone: Option<String>,
        status: DeliveryStatus,
        priority: DeliveryPriority,
        scheduled_date: NaiveDate,
        delivered_at: Option<DateTime<Utc>>,
        customer_signature: Option<String>,
        notes: Option<String>,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            delivery_agent_id,
            items,
            customer_name,
            customer_address,
            customer_phone,
            status,
            priority,
            scheduled_date,
            delivered_at,
            customer_signature,
            notes,
            version,
            created_at,
            updated_at,
        }
    }

    /// Copy of this delivery as it reads after one more persisted write
    pub fn with_next_version(&self) -> Self {
        Self {
            version: self.version + 1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, quantity: i32) -> DeliveryItem {
        DeliveryItem {
            product_id: Uuid::new_v4(),
            sku: sku.to_string(),
            product_name: format!("Product {}", sku),
            quantity,
            damaged: false,
            returned: false,
        }
    }

    fn input(agent: Uuid) -> NewDelivery {
        NewDelivery {
            delivery_agent_id: agent,
            items: vec![item("BOOK-1", 2), item("TOY-9", 1)],
            customer_name: "Nimal Perera".to_string(),
            customer_address: "12 Temple Rd, Kandy".to_string(),
            customer_phone: Some("+94771234567".to_string()),
            status: None,
            priority: None,
            scheduled_date: None,
            notes: None,
        }
    }

    fn in_transit(agent: Uuid) -> Delivery {
        let mut delivery = Delivery::new(input(agent)).unwrap();
        delivery.transition_to(DeliveryStatus::InTransit, None).unwrap();
        delivery
    }

    #[test]
    fn new_delivery_defaults() {
        let agent = Uuid::new_v4();
        let delivery = Delivery::new(input(agent)).unwrap();

        assert_eq!(delivery.status(), DeliveryStatus::Pending);
        assert_eq!(delivery.priority(), DeliveryPriority::Normal);
        assert_eq!(delivery.scheduled_date(), Utc::now().date_naive());
        assert_eq!(delivery.delivery_agent_id(), agent);
        assert!(delivery.delivered_at().is_none());
        assert_eq!(delivery.version(), 0);
    }

    #[test]
    fn new_delivery_rejects_empty_items_and_bad_quantities() {
        let mut bad = input(Uuid::new_v4());
        bad.items = vec![];
        assert!(Delivery::new(bad).is_err());

        let mut bad = input(Uuid::new_v4());
        bad.items[1].quantity = 0;
        match Delivery::new(bad) {
            Err(DomainError::Validation(list)) => assert_eq!(list[0].field, "items[1].quantity"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn new_delivery_rejects_outcome_status() {
        let mut bad = input(Uuid::new_v4());
        bad.status = Some(DeliveryStatus::Delivered);
        assert!(Delivery::new(bad).is_err());

        let mut ok = input(Uuid::new_v4());
        ok.status = Some(DeliveryStatus::InTransit);
        assert_eq!(Delivery::new(ok).unwrap().status(), DeliveryStatus::InTransit);
    }

    #[test]
    fn ownership_check() {
        let agent = Uuid::new_v4();
        let delivery = Delivery::new(input(agent)).unwrap();
        assert!(delivery.ensure_assigned_to(agent).is_ok());
        assert!(matches!(
            delivery.ensure_assigned_to(Uuid::new_v4()),
            Err(DomainError::NotAssignedAgent { .. })
        ));
    }

    #[test]
    fn complete_stamps_delivered_at_once() {
        let mut delivery = in_transit(Uuid::new_v4());
        delivery
            .complete("Nimal".to_string(), "data:image/png;base64,AAAA".to_string())
            .unwrap();

        let stamped = delivery.delivered_at().expect("delivered_at set");
        assert_eq!(delivery.status(), DeliveryStatus::Delivered);
        assert_eq!(delivery.customer_signature(), Some("data:image/png;base64,AAAA"));

        let again = delivery.complete("Nimal".to_string(), "sig".to_string());
        assert!(matches!(again, Err(DomainError::InvalidStatusTransition { .. })));
        assert_eq!(delivery.delivered_at(), Some(stamped));
    }

    #[test]
    fn complete_requires_signature() {
        let mut delivery = in_transit(Uuid::new_v4());
        assert!(delivery.complete("Nimal".to_string(), " ".to_string()).is_err());
        assert_eq!(delivery.status(), DeliveryStatus::InTransit);
    }

    #[test]
    fn pending_cannot_be_completed() {
        let mut delivery = Delivery::new(input(Uuid::new_v4())).unwrap();
        assert!(delivery.complete("Nimal".to_string(), "sig".to_string()).is_err());
        assert!(delivery.delivered_at().is_none());
    }

    #[test]
    fn transition_keeps_notes_unless_given() {
        let mut delivery = in_transit(Uuid::new_v4());
        delivery
            .transition_to(DeliveryStatus::DoorLock, Some("Nobody home".to_string()))
            .unwrap();
        delivery.transition_to(DeliveryStatus::InTransit, None).unwrap();
        assert_eq!(delivery.notes(), Some("Nobody home"));
    }

    #[test]
    fn flag_items_by_sku() {
        let mut delivery = in_transit(Uuid::new_v4());
        delivery
            .flag_items(&[ItemFlags {
                sku: "TOY-9".to_string(),
                damaged: true,
                returned: false,
            }])
            .unwrap();

        let flagged: Vec<_> = delivery.restock_items().map(|i| i.sku.as_str()).collect();
        assert_eq!(flagged, vec!["TOY-9"]);
        assert!(delivery.has_damaged_items());
    }

    #[test]
    fn flag_unknown_sku_rejected_without_changes() {
        let mut delivery = in_transit(Uuid::new_v4());
        let result = delivery.flag_items(&[
            ItemFlags {
                sku: "BOOK-1".to_string(),
                damaged: false,
                returned: true,
            },
            ItemFlags {
                sku: "NOPE-1".to_string(),
                damaged: true,
                returned: false,
            },
        ]);

        assert!(result.is_err());
        assert_eq!(delivery.restock_items().count(), 0);
    }

    #[test]
    fn flags_frozen_after_terminal_status() {
        let mut delivery = in_transit(Uuid::new_v4());
        delivery.transition_to(DeliveryStatus::Returned, None).unwrap();
        let result = delivery.flag_items(&[ItemFlags {
            sku: "BOOK-1".to_string(),
            damaged: true,
            returned: false,
        }]);
        assert!(matches!(result, Err(DomainError::InvalidOperation(_))));
    }
}
