//! Cart route handlers.
//!
//! The cart belongs to the signed-in user and lives in the database, so it
//! follows the user across devices.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use dac_retail_core::ProductId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{CartItemView, CartLine, CartView};
use crate::state::AppState;

/// Body of an add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

impl Default for AddToCart {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
        }
    }
}

const fn default_quantity() -> i32 {
    1
}

/// Show the current user's cart.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(state.cart().get_cart(user.id).await?))
}

/// Show one line of the cart.
pub async fn line(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<CartItemView>> {
    Ok(Json(state.cart().get_line(user.id, product_id).await?))
}

/// Add a product to the cart. An absent body adds one unit.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
    body: Option<ApiJson<AddToCart>>,
) -> Result<(StatusCode, Json<CartLine>)> {
    let ApiJson(body) = body.unwrap_or_default();
    let line = state
        .cart()
        .add_line(user.id, product_id, body.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// Remove a product's line from the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    state.cart().remove_line(user.id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
