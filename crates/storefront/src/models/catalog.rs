//! Catalog types: categories, products and their size variants.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dac_retail_core::{CategoryId, Price, ProductId, SizeKind};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// One size a product is offered in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductSize {
    pub kind: SizeKind,
    pub size: String,
}

/// A sellable product.
///
/// `quantity_available` is never negative once a transaction commits. Only
/// order placement and cancellation change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub quantity_available: i32,
    pub image: Option<String>,
    pub seller: String,
    pub brand_name: String,
    pub listing_date: NaiveDate,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub highlights: String,
    pub color: Option<String>,
    pub fabric: Option<String>,
    pub sizes: Vec<ProductSize>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be sold right now.
    #[must_use]
    pub const fn has_stock_for(&self, quantity: i32) -> bool {
        quantity <= self.quantity_available
    }
}

/// Input for creating or replacing a product (catalog seeding).
///
/// Products are keyed by `(category_id, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub quantity_available: i32,
    pub image: Option<String>,
    pub seller: String,
    pub brand_name: String,
    pub listing_date: NaiveDate,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub highlights: String,
    pub color: Option<String>,
    pub fabric: Option<String>,
    pub sizes: Vec<ProductSize>,
}
