//! Session-related types.
//!
//! Accounts and login live in the external account service, which writes the
//! signed-in user into the shared session store. The storefront only reads it.

use serde::{Deserialize, Serialize};

use dac_retail_core::{Email, UserId};

/// Session-stored user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's account ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
