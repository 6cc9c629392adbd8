//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database ping)
//!
//! # Catalog
//! GET  /api/home                        - Products and categories together
//! GET  /api/categories                  - Category listing
//! GET  /api/categories/{id}/products    - Category with its products
//! GET  /api/products                    - Product listing
//! GET  /api/products/{id}               - Product detail
//!
//! # Account (requires auth)
//! GET  /api/me                          - Signed-in user
//!
//! # Cart (requires auth)
//! GET    /api/cart                      - Current cart
//! GET    /api/cart/items/{product_id}   - One cart line
//! POST   /api/cart/items/{product_id}   - Add to cart
//! DELETE /api/cart/items/{product_id}   - Remove from cart
//!
//! # Orders (requires auth)
//! POST /api/orders                      - Place order from cart
//! GET  /api/orders                      - Order history
//! GET  /api/orders/{order_number}       - Order detail
//! POST /api/orders/{order_number}/cancel - Cancel order
//!
//! # Payments and shipments (requires auth)
//! GET  /api/payments                    - Saved payment profiles
//! PUT  /api/payments                    - Save payment method
//! GET  /api/shipments                   - Shipment tracking
//! ```

pub mod account;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod orders;
pub mod payments;
pub mod shipments;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(catalog::home))
        .route("/categories", get(catalog::categories))
        .route("/categories/{id}/products", get(catalog::category_products))
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/", get(cart::show)).route(
        "/items/{product_id}",
        get(cart::line).post(cart::add).delete(cart::remove),
    )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::place))
        .route("/{order_number}", get(orders::show))
        .route("/{order_number}/cancel", post(orders::cancel))
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .route("/me", get(account::me))
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .route("/payments", get(payments::index).put(payments::update))
        .route("/shipments", get(shipments::index))
}

/// Create all routes for the storefront.
///
/// The caller adds the session layer and outer middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}
