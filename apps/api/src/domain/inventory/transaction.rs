use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::product::Product;

/// Kind of stock movement recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// New stock received
    StockIn,
    /// Stock handed out for delivery
    StockOut,
    /// Stock back from a delivery
    Return,
    /// Manual correction; quantity is the signed change
    Adjustment,
    /// Damaged stock
    Damaged,
    /// Expired stock written off
    Expired,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionType::StockIn => "STOCK_IN",
            TransactionType::StockOut => "STOCK_OUT",
            TransactionType::Return => "RETURN",
            TransactionType::Adjustment => "ADJUSTMENT",
            TransactionType::Damaged => "DAMAGED",
            TransactionType::Expired => "EXPIRED",
        };
        f.write_str(name)
    }
}

/// Append-only ledger entry describing one stock movement of one product
///
/// # Invariants
/// - `quantity` is positive, except for `Adjustment` where it is a non-zero
///   signed change
/// - Immutable once recorded
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub kind: TransactionType,
    pub quantity: i32,
    pub user_id: Uuid,
    pub delivery_id: Option<Uuid>,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl InventoryTransaction {
    /// Creates a ledger entry for `product`, timestamped now
    ///
    /// # Example
    /// ```
    /// use dlvery_api::domain::inventory::{InventoryTransaction, TransactionType};
    /// use dlvery_api::domain::product::{Product, ProductCategory, ProductDetails};
    /// use uuid::Uuid;
    ///
    /// let product = Product::new("TOY-42".to_string(), ProductDetails {
    ///     name: "Kite".to_string(),
    ///     description: None,
    ///     category: ProductCategory::Toys,
    ///     damaged: false,
    ///     perishable: false,
    ///     expiry_date: None,
    ///     quantity: 3,
    /// }).unwrap();
    ///
    /// let tx = InventoryTransaction::new(&product, TransactionType::StockOut, 2, Uuid::new_v4(), None, None)
    ///     .expect("valid transaction");
    /// assert_eq!(tx.quantity_delta(), -2);
    /// ```
    pub fn new(
        product: &Product,
        kind: TransactionType,
        quantity: i32,
        user_id: Uuid,
        delivery_id: Option<Uuid>,
        notes: Option<String>,
    ) -> DomainResult<Self> {
        match kind {
            TransactionType::Adjustment if quantity == 0 => {
                return Err(DomainError::validation(
                    "quantity",
                    "Adjustment quantity must not be zero",
                ));
            }
            TransactionType::Adjustment => {}
            _ if quantity <= 0 => {
                return Err(DomainError::validation(
                    "quantity",
                    "Quantity must be greater than zero",
                ));
            }
            _ => {}
        }

        Ok(Self {
            id: Uuid::new_v4(),
            product_id: product.id(),
            sku: product.sku().to_string(),
            kind,
            quantity,
            user_id,
            delivery_id,
            notes,
            timestamp: Utc::now(),
        })
    }

    /// Signed change this entry makes to the product's stock on hand
    ///
    /// A `Damaged` entry linked to a delivery is damaged goods coming back
    /// into the warehouse and adds stock; an unlinked one is a write-off.
    pub fn quantity_delta(&self) -> i32 {
        match self.kind {
            TransactionType::StockIn | TransactionType::Return | TransactionType::Adjustment => {
                self.quantity
            }
            TransactionType::StockOut | TransactionType::Expired => -self.quantity,
            TransactionType::Damaged if self.delivery_id.is_some() => self.quantity,
            TransactionType::Damaged => -self.quantity,
        }
    }
}
