use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::value_objects::ProductCategory;
use crate::domain::errors::{DomainError, DomainResult, Violations};
use crate::domain::inventory::{InventoryTransaction, TransactionType};

/// Mutable attributes of a product, shared by creation and full updates
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub damaged: bool,
    pub perishable: bool,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i32,
}

impl ProductDetails {
    fn collect_violations(&self, violations: &mut Violations) {
        let name_len = self.name.trim().chars().count();
        violations.check(
            (2..=100).contains(&name_len),
            "name",
            "Name must be between 2 and 100 characters",
        );
        if let Some(description) = &self.description {
            violations.check(
                description.chars().count() <= 500,
                "description",
                "Description must be at most 500 characters",
            );
        }
        violations.check(
            self.quantity >= 0,
            "quantity",
            "Quantity cannot be negative",
        );
        violations.check(
            !self.perishable || self.expiry_date.is_some(),
            "expiry_date",
            "Expiry date is required for perishable items",
        );
    }
}

/// Product aggregate root
///
/// Stock on hand is only ever changed through [`Product::apply_transaction`]
/// or a full update, both of which keep the quantity non-negative.
///
/// # Invariants
/// - SKU is 3 to 20 characters and never changes
/// - Quantity is never negative
/// - Perishable products carry an expiry date
/// - `version` increases by one on every persisted write
#[derive(Debug, Clone)]
pub struct Product {
    id: Uuid,
    sku: String,
    name: String,
    description: Option<String>,
    category: ProductCategory,
    damaged: bool,
    perishable: bool,
    expiry_date: Option<NaiveDate>,
    quantity: i32,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product
    ///
    /// # Example
    /// ```
    /// use dlvery_api::domain::product::{Product, ProductCategory, ProductDetails};
    ///
    /// let product = Product::new(
    ///     "MED-001".to_string(),
    ///     ProductDetails {
    ///         name: "Paracetamol".to_string(),
    ///         description: None,
    ///         category: ProductCategory::Medicine,
    ///         damaged: false,
    ///         perishable: false,
    ///         expiry_date: None,
    ///         quantity: 40,
    ///     },
    /// )
    /// .expect("valid product");
    ///
    /// assert_eq!(product.quantity(), 40);
    /// ```
    pub fn new(sku: String, details: ProductDetails) -> DomainResult<Self> {
        let sku = sku.trim().to_string();
        let mut violations = Violations::new();
        violations.check(
            (3..=20).contains(&sku.chars().count()),
            "sku",
            "SKU must be between 3 and 20 characters",
        );
        details.collect_violations(&mut violations);
        violations.into_result()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            sku,
            name: details.name.trim().to_string(),
            description: details.description,
            category: details.category,
            damaged: details.damaged,
            perishable: details.perishable,
            expiry_date: details.expiry_date,
            quantity: details.quantity,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces every mutable attribute, SKU excluded
    pub fn update(&mut self, details: ProductDetails) -> DomainResult<()> {
        let mut violations = Violations::new();
        details.collect_violations(&mut violations);
        violations.into_result()?;

        self.name = details.name.trim().to_string();
        self.description = details.description;
        self.category = details.category;
        self.damaged = details.damaged;
        self.perishable = details.perishable;
        self.expiry_date = details.expiry_date;
        self.quantity = details.quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Applies a ledger entry to the stock on hand
    ///
    /// Rejects the entry, leaving the product untouched, when it belongs to
    /// another product or would drive the quantity below zero. A `DAMAGED`
    /// entry also flags the product as damaged.
    pub fn apply_transaction(&mut self, transaction: &InventoryTransaction) -> DomainResult<()> {
        if transaction.product_id != self.id {
            return Err(DomainError::InvalidOperation(format!(
                "Transaction for product {} cannot be applied to product {}",
                transaction.product_id, self.id
            )));
        }

        let change = transaction.quantity_delta();
        let new_quantity = self
            .quantity
            .checked_add(change)
            .filter(|quantity| *quantity >= 0)
            .ok_or_else(|| DomainError::InsufficientStock {
                sku: self.sku.clone(),
                available: self.quantity,
                change,
            })?;

        self.quantity = new_quantity;
        if transaction.kind == TransactionType::Damaged {
            self.damaged = true;
        }
        self.updated_at = transaction.timestamp;
        Ok(())
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> ProductCategory {
        self.category
    }

    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    pub fn is_perishable(&self) -> bool {
        self.perishable
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    /// Version read from storage; writes are conditional on it
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Product from persistence layer data
    ///
    /// Bypasses validation; only for repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        sku: String,
        name: String,
        description: Option<String>,
        category: ProductCategory,
        damaged: bool,
        perishable: bool,
        expiry_date: Option<NaiveDate>,
        quantity: i32,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sku,
            name,
            description,
            category,
            damaged,
            perishable,
            expiry_date,
            quantity,
            version,
            created_at,
            updated_at,
        }
    }

    /// Copy of this product as it reads after one more persisted write
    pub fn with_next_version(&self) -> Self {
        Self {
            version: self.version + 1,
            ..self.clone()
        }
    }
}
