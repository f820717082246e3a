use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a delivery
///
/// # Status Transitions
/// ```text
/// Pending -> InTransit -> Delivered
///     ^          |  ^ \--> Returned | PartiallyDelivered | Damaged
///     |          v  |
///     \------ DoorLock ---> Returned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "delivery_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Assigned but not yet started
    Pending,
    /// Agent is on the way
    InTransit,
    /// Handed to the customer
    Delivered,
    /// Customer not available; retry or reschedule
    DoorLock,
    /// Everything came back to the warehouse
    Returned,
    /// Some items delivered, the rest came back
    PartiallyDelivered,
    /// Items damaged on the way
    Damaged,
}

impl DeliveryStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Valid Transitions
    /// - Pending -> InTransit
    /// - InTransit -> Delivered | DoorLock | Returned | PartiallyDelivered | Damaged
    /// - DoorLock -> InTransit | Pending | Returned
    ///
    /// # Example
    /// ```
    /// use dlvery_api::domain::delivery::DeliveryStatus;
    ///
    /// assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::InTransit));
    /// assert!(!DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Delivered));
    /// ```
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, InTransit)
                | (InTransit, Delivered)
                | (InTransit, DoorLock)
                | (InTransit, Returned)
                | (InTransit, PartiallyDelivered)
                | (InTransit, Damaged)
                | (DoorLock, InTransit)
                | (DoorLock, Pending)
                | (DoorLock, Returned)
        )
    }

    /// Fulfilment outcome is final; no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Delivered
                | DeliveryStatus::Returned
                | DeliveryStatus::PartiallyDelivered
                | DeliveryStatus::Damaged
        )
    }

    /// Entering this status puts flagged items back into stock
    pub fn restocks_flagged_items(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Returned | DeliveryStatus::PartiallyDelivered | DeliveryStatus::Damaged
        )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::InTransit => "IN_TRANSIT",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::DoorLock => "DOOR_LOCK",
            DeliveryStatus::Returned => "RETURNED",
            DeliveryStatus::PartiallyDelivered => "PARTIALLY_DELIVERED",
            DeliveryStatus::Damaged => "DAMAGED",
        };
        f.write_str(name)
    }
}

/// Dispatch priority of a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "delivery_priority", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryPriority {
    Low,
    #[default]
    Normal,
    High,
    /// Emergency products
    Urgent,
    /// Perishable products that need quick delivery
    Perishable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeliveryStatus::*;

    const ALL: [DeliveryStatus; 7] = [
        Pending,
        InTransit,
        Delivered,
        DoorLock,
        Returned,
        PartiallyDelivered,
        Damaged,
    ];

    #[test]
    fn pending_only_starts() {
        for next in ALL {
            assert_eq!(Pending.can_transition_to(next), next == InTransit);
        }
    }

    #[test]
    fn in_transit_reaches_every_outcome() {
        for next in [Delivered, DoorLock, Returned, PartiallyDelivered, Damaged] {
            assert!(InTransit.can_transition_to(next));
        }
        assert!(!InTransit.can_transition_to(Pending));
        assert!(!InTransit.can_transition_to(InTransit));
    }

    #[test]
    fn door_lock_can_retry_reschedule_or_return() {
        assert!(DoorLock.can_transition_to(InTransit));
        assert!(DoorLock.can_transition_to(Pending));
        assert!(DoorLock.can_transition_to(Returned));
        assert!(!DoorLock.can_transition_to(Delivered));
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        for status in ALL.into_iter().filter(DeliveryStatus::is_terminal) {
            for next in ALL {
                assert!(!status.can_transition_to(next), "{} -> {}", status, next);
            }
        }
    }

    #[test]
    fn restocking_statuses() {
        assert!(Returned.restocks_flagged_items());
        assert!(PartiallyDelivered.restocks_flagged_items());
        assert!(Damaged.restocks_flagged_items());
        assert!(!Delivered.restocks_flagged_items());
        assert!(!DoorLock.restocks_flagged_items());
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&PartiallyDelivered).unwrap(), "\"PARTIALLY_DELIVERED\"");
        assert_eq!(DoorLock.to_string(), "DOOR_LOCK");
        let parsed: DeliveryStatus = serde_json::from_str("\"IN_TRANSIT\"").unwrap();
        assert_eq!(parsed, InTransit);
    }

    #[test]
    fn priority_defaults_to_normal() {
        assert_eq!(DeliveryPriority::default(), DeliveryPriority::Normal);
    }
}
