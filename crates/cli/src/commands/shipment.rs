//! Shipment management commands.
//!
//! # Usage
//!
//! ```bash
//! dac-cli shipment create AB12CD34 --courier delhivery --tracking-id DL998 --expected 2026-11-02
//! dac-cli shipment advance AB12CD34 delivered
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use dac_retail_core::{Courier, DeliveryStatus, OrderNumber, OrderNumberError};
use dac_retail_storefront::db::PgStore;
use dac_retail_storefront::services::{CommerceError, ShipmentService};

use super::ConnectError;

/// Errors that can occur during shipment operations.
#[derive(Debug, thiserror::Error)]
pub enum ShipmentError {
    #[error("Invalid order number: {0}")]
    OrderNumber(#[from] OrderNumberError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

async fn service() -> Result<ShipmentService, ConnectError> {
    let pool = super::connect().await?;
    Ok(ShipmentService::new(Arc::new(PgStore::new(pool))))
}

/// Ship an order.
///
/// # Errors
///
/// Returns an error if the order number is malformed, the order cannot be
/// shipped, or the database fails.
pub async fn create(
    order_number: &str,
    courier: Courier,
    tracking_id: &str,
    expected: NaiveDate,
) -> Result<(), ShipmentError> {
    let number = OrderNumber::parse(order_number)?;
    let shipment = service()
        .await?
        .create_shipment(&number, courier, tracking_id, expected)
        .await?;

    info!(
        order_number = %number,
        shipment_id = %shipment.id,
        expected = %shipment.expected_delivery_date,
        "Shipment created"
    );
    Ok(())
}

/// Move a shipment forward.
///
/// # Errors
///
/// Returns an error if the order number is malformed, the order has no
/// shipment, or `status` would move the shipment backwards.
pub async fn advance(order_number: &str, status: DeliveryStatus) -> Result<(), ShipmentError> {
    let number = OrderNumber::parse(order_number)?;
    service().await?.advance_shipment(&number, status).await?;

    info!(order_number = %number, %status, "Shipment advanced");
    Ok(())
}
