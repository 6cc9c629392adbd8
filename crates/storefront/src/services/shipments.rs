//! Shipment tracking.
//!
//! Shipments drive the order's shipping status: creating one marks the order
//! `shipped`, and delivering it marks the order `delivered`. Delivery status
//! only moves forward.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use dac_retail_core::{Courier, DeliveryStatus, OrderNumber, ShippingStatus, UserId};

use super::CommerceError;
use crate::db::Store;
use crate::models::{NewShipment, OrderWithLines, Shipment, ShipmentView};

const MAX_TRACKING_ID_LENGTH: usize = 100;

#[derive(Clone)]
pub struct ShipmentService {
    store: Arc<dyn Store>,
}

impl ShipmentService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The user's shipments with the orders they carry.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<ShipmentView>, CommerceError> {
        let mut uow = self.store.begin().await?;
        let mut views = Vec::new();
        for shipment in uow.list_shipments(user).await? {
            let Some(order) = uow.get_order(shipment.order_id).await? else {
                continue;
            };
            let items = uow.order_lines(order.id).await?;
            views.push(ShipmentView::new(shipment, &OrderWithLines { order, items }));
        }
        Ok(views)
    }

    /// Ship an order.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown order
    /// - `InvalidState` if the order is not `not_shipped` or already has a
    ///   shipment
    /// - `Validation` for an over-long tracking id
    #[instrument(skip(self, tracking_id), fields(order_number = %number))]
    pub async fn create_shipment(
        &self,
        number: &OrderNumber,
        courier: Courier,
        tracking_id: &str,
        expected_delivery_date: NaiveDate,
    ) -> Result<Shipment, CommerceError> {
        let tracking_id = tracking_id.trim();
        if tracking_id.len() > MAX_TRACKING_ID_LENGTH {
            return Err(CommerceError::Validation(format!(
                "tracking id must be at most {MAX_TRACKING_ID_LENGTH} characters"
            )));
        }

        let mut uow = self.store.begin().await?;
        let order = uow
            .lock_order(number)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("order {number}")))?;
        if order.shipping_status != ShippingStatus::NotShipped {
            return Err(CommerceError::InvalidState(format!(
                "order {number} is {} and cannot be shipped",
                order.shipping_status
            )));
        }
        if uow.find_shipment(order.id).await?.is_some() {
            return Err(CommerceError::InvalidState(format!(
                "order {number} already has a shipment"
            )));
        }

        let shipment = uow
            .insert_shipment(&NewShipment {
                order_id: order.id,
                courier,
                tracking_id: tracking_id.to_owned(),
                expected_delivery_date,
            })
            .await?;
        uow.set_shipping_status(order.id, ShippingStatus::Shipped)
            .await?;
        uow.commit().await?;

        info!(%courier, "Order shipped");
        Ok(shipment)
    }

    /// Move an order's shipment forward.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order or its shipment does not exist
    /// - `InvalidState` if `status` is not ahead of the current status
    #[instrument(skip(self), fields(order_number = %number, status = %status))]
    pub async fn advance_shipment(
        &self,
        number: &OrderNumber,
        status: DeliveryStatus,
    ) -> Result<Shipment, CommerceError> {
        let mut uow = self.store.begin().await?;
        let order = uow
            .lock_order(number)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("order {number}")))?;
        let shipment = uow
            .find_shipment(order.id)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("shipment for order {number}")))?;
        if !shipment.delivery_status.can_advance_to(status) {
            return Err(CommerceError::InvalidState(format!(
                "shipment cannot move from {} to {status}",
                shipment.delivery_status
            )));
        }

        uow.set_delivery_status(shipment.id, status).await?;
        if status == DeliveryStatus::Delivered {
            uow.set_shipping_status(order.id, ShippingStatus::Delivered)
                .await?;
        }
        uow.commit().await?;

        info!("Shipment advanced");
        Ok(Shipment {
            delivery_status: status,
            ..shipment
        })
    }
}
