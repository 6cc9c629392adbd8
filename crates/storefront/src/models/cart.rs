//! Cart types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dac_retail_core::{CartId, CartLineId, Price, ProductId, UserId};

use super::catalog::Product;

/// A user's cart. Each user has at most one, created on first add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A (product, quantity) entry in a cart. Quantity is at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A cart line joined with its product, as shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub product: String,
    pub price: Price,
    pub image: Option<String>,
    pub quantity: i32,
    pub line_total: Price,
}

impl CartItemView {
    /// Join a line with its product at the product's current price.
    #[must_use]
    pub fn new(line: &CartLine, product: &Product) -> Self {
        Self {
            product_id: product.id,
            product: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: line.quantity,
            line_total: product.price.times(line.quantity),
        }
    }
}

/// The whole cart with a subtotal at current prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub cart_items: Vec<CartItemView>,
    pub cart_total: Price,
}

impl CartView {
    /// Build a view, computing the subtotal from the items.
    #[must_use]
    pub fn new(cart_items: Vec<CartItemView>) -> Self {
        let cart_total = cart_items.iter().map(|item| item.line_total).sum();
        Self {
            cart_items,
            cart_total,
        }
    }
}
