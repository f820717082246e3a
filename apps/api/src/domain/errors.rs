use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use super::delivery::DeliveryStatus;

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Business rule violations raised by domain aggregates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Validation failed: {}", display_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("Cannot reduce quantity of {sku} below zero (available {available}, change {change})")]
    InsufficientStock {
        sku: String,
        available: i32,
        change: i32,
    },

    #[error("Delivery {delivery_id} is not assigned to agent {agent_id}")]
    NotAssignedAgent { delivery_id: Uuid, agent_id: Uuid },

    #[error("{0}")]
    InvalidOperation(String),
}

impl DomainError {
    /// Shorthand for a single-field validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation {
            field: field.into(),
            message: message.into(),
        }])
    }
}

fn display_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Accumulates field violations so callers see every problem at once
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Records `message` against `field` when `condition` does not hold
    pub fn check(&mut self, condition: bool, field: &str, message: &str) {
        if !condition {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> DomainResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.0))
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_collect_every_field() {
        let mut violations = Violations::new();
        violations.check(false, "sku", "SKU is required");
        violations.check(true, "name", "never recorded");
        violations.add("quantity", "Quantity cannot be negative");

        match violations.into_result() {
            Err(DomainError::Validation(list)) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0].field, "sku");
                assert_eq!(list[1].field, "quantity");
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_violations_pass() {
        assert!(Violations::new().into_result().is_ok());
    }

    #[test]
    fn validation_message_lists_fields() {
        let err = DomainError::validation("email", "Invalid email");
        assert_eq!(err.to_string(), "Validation failed: email: Invalid email");
    }
}
