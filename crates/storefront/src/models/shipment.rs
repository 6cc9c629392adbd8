//! Shipment types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use dac_retail_core::{Courier, DeliveryStatus, OrderId, OrderNumber, Price, ShipmentId};

use super::order::OrderWithLines;

/// Carrier tracking for an order. One per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub courier: Courier,
    pub tracking_id: String,
    pub shipped_at: DateTime<Utc>,
    pub expected_delivery_date: NaiveDate,
    pub delivery_status: DeliveryStatus,
}

/// Input for creating a shipment. Status starts at `in_transit`.
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub order_id: OrderId,
    pub courier: Courier,
    pub tracking_id: String,
    pub expected_delivery_date: NaiveDate,
}

/// One line of a shipped order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippedItem {
    pub product_name: String,
    pub quantity: i32,
}

/// A shipment joined with the order it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentView {
    pub order_number: OrderNumber,
    pub recipient: String,
    pub address: String,
    pub total: Price,
    pub courier: Courier,
    pub tracking_id: String,
    pub shipped_at: DateTime<Utc>,
    pub expected_delivery_date: NaiveDate,
    pub delivery_status: DeliveryStatus,
    pub items: Vec<ShippedItem>,
}

impl ShipmentView {
    #[must_use]
    pub fn new(shipment: Shipment, order: &OrderWithLines) -> Self {
        Self {
            order_number: order.order.order_number.clone(),
            recipient: order.order.shipping.full_name.clone(),
            address: order.order.shipping.address.clone(),
            total: order.order.total,
            courier: shipment.courier,
            tracking_id: shipment.tracking_id,
            shipped_at: shipment.shipped_at,
            expected_delivery_date: shipment.expected_delivery_date,
            delivery_status: shipment.delivery_status,
            items: order
                .items
                .iter()
                .map(|line| ShippedItem {
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}
