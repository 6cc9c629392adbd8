//! Storage for the storefront.
//!
//! # Database: `dac_retail`
//!
//! All domain tables live in the `store` schema:
//!
//! - `product_category`, `product`, `product_size` - Catalog
//! - `cart`, `cart_line` - One cart per user
//! - `"order"`, `order_line` - Placed orders with price snapshots
//! - `payment_profile` - One billing record per user
//! - `shipment` - One per shipped order
//!
//! Sessions live in `tower_sessions.session`.
//!
//! Every read and write goes through a [`UnitOfWork`] obtained from a
//! [`Store`]. [`PgStore`] backs production; [`MemoryStore`] backs tests and
//! local development.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p dac-retail-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
pub mod store;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::{CommitFailure, MemoryState, MemoryStore};
pub use postgres::PgStore;
pub use store::{CartStore, CatalogStore, OrderStore, PaymentStore, ShipmentStore, Store, UnitOfWork};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique violation or a transaction that lost a race. Safe to retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A check constraint rejected the write (e.g. stock below zero).
    #[error("constraint violation: {0}")]
    Constraint(String),
}

impl RepositoryError {
    /// Whether rerunning the whole transaction may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                // unique_violation, serialization_failure, deadlock_detected
                Some("23505" | "40001" | "40P01") => {
                    return Self::Conflict(db_err.message().to_owned());
                }
                // check_violation, foreign_key_violation, numeric_value_out_of_range
                Some("23514" | "23503" | "22003") => {
                    return Self::Constraint(db_err.message().to_owned());
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
