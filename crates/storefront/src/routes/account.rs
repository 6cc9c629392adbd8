//! Account route handlers.

use axum::Json;

use crate::middleware::RequireAuth;
use crate::models::CurrentUser;

/// The signed-in user, as the account service stored it in the session.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}
