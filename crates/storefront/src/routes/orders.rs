//! Order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use dac_retail_core::OrderNumber;

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{CheckoutRequest, OrderWithLines};
use crate::services::PlacedOrder;
use crate::state::AppState;

/// Parse an order number from the path. Malformed numbers cannot name an
/// order, so they are reported as not found.
fn order_number(raw: &str) -> Result<OrderNumber> {
    OrderNumber::parse(raw).map_err(|_| AppError::NotFound(format!("order {raw}")))
}

/// Place an order from the current cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = state.orders().place_order(user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// The current user's orders, most recent first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderWithLines>>> {
    Ok(Json(state.orders().list_orders(user.id).await?))
}

/// Order detail.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(raw): ApiPath<String>,
) -> Result<Json<OrderWithLines>> {
    let number = order_number(&raw)?;
    Ok(Json(state.orders().get_order(user.id, &number).await?))
}

/// Cancel an order that has not shipped.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(raw): ApiPath<String>,
) -> Result<Json<OrderWithLines>> {
    let number = order_number(&raw)?;
    Ok(Json(state.orders().cancel_order(user.id, &number).await?))
}
