//! Shipment tracking route handlers.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::ShipmentView;
use crate::state::AppState;

/// Shipments for the current user's orders.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ShipmentView>>> {
    Ok(Json(state.shipments().list_for_user(user.id).await?))
}
