//! Payment profile route handlers.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::{PaymentMethodRequest, PaymentProfile};
use crate::state::AppState;

/// The current user's payment profiles.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<PaymentProfile>>> {
    Ok(Json(state.payments().list_profiles(user.id).await?))
}

/// Save a card or UPI as the preferred payment method.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<PaymentMethodRequest>,
) -> Result<Json<PaymentProfile>> {
    Ok(Json(
        state
            .payments()
            .save_payment_method(user.id, &request)
            .await?,
    ))
}
