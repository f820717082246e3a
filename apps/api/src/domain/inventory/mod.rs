// Inventory ledger domain module

pub mod transaction;

pub use transaction::{InventoryTransaction, TransactionType};
