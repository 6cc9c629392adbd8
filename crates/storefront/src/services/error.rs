//! Errors returned by the storefront services.

use thiserror::Error;

use dac_retail_core::{ContactError, ProductId};

use crate::db::RepositoryError;
use crate::models::PaymentMethodError;

/// Errors that can occur in catalog, cart, order, payment and shipment
/// operations.
///
/// Domain-rule violations are detected before anything is written, so a
/// caller seeing any variant other than `Persistence` knows the store is
/// unchanged.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The named entity does not exist, or belongs to someone else.
    #[error("{0} not found")]
    NotFound(String),

    /// A cart line asks for more units than are in stock.
    #[error(
        "insufficient stock for {product_name}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: i32,
        available: i32,
    },

    /// The entity is not in a state that allows the transition.
    #[error("{0}")]
    InvalidState(String),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The store failed; the transaction was rolled back.
    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

impl CommerceError {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}

impl From<ContactError> for CommerceError {
    fn from(err: ContactError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PaymentMethodError> for CommerceError {
    fn from(err: PaymentMethodError) -> Self {
        Self::Validation(err.to_string())
    }
}
