use serde::{Deserialize, Serialize};
use std::fmt;

/// Product classification used for browsing and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "product_category", rename_all = "UPPERCASE")]
pub enum ProductCategory {
    Electronics,
    Clothing,
    Food,
    Medicine,
    Furniture,
    Toys,
    Books,
    Essential,
    Emergency,
    Other,
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProductCategory::Electronics => "ELECTRONICS",
            ProductCategory::Clothing => "CLOTHING",
            ProductCategory::Food => "FOOD",
            ProductCategory::Medicine => "MEDICINE",
            ProductCategory::Furniture => "FURNITURE",
            ProductCategory::Toys => "TOYS",
            ProductCategory::Books => "BOOKS",
            ProductCategory::Essential => "ESSENTIAL",
            ProductCategory::Emergency => "EMERGENCY",
            ProductCategory::Other => "OTHER",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_json_names() {
        let parsed: ProductCategory = serde_json::from_str("\"MEDICINE\"").unwrap();
        assert_eq!(parsed, ProductCategory::Medicine);
        assert_eq!(parsed.to_string(), "MEDICINE");
    }

    #[test]
    fn unknown_category_rejected() {
        let parsed: Result<ProductCategory, _> = serde_json::from_str("\"WEAPONS\"");
        assert!(parsed.is_err());
    }
}
