//! Order types.
//!
//! An order is immutable once placed apart from its shipping status. Lines
//! snapshot the unit price at placement time and never follow later catalog
//! price changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dac_retail_core::{
    ContactError, Email, MobileNumber, OrderId, OrderLineId, OrderNumber, PaymentMethod, PinCode,
    Price, ProductId, ShippingStatus, UserId,
};

use super::catalog::Product;

/// Shipping and contact details snapshotted onto an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: Email,
    pub address: String,
    pub city: String,
    pub pin_code: PinCode,
    pub state: String,
    pub mobile: MobileNumber,
}

/// Checkout form as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub pin_code: String,
    pub state: String,
    pub mobile: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutRequest {
    /// Validate the form into shipping details.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<ShippingDetails, ContactError> {
        Ok(ShippingDetails {
            full_name: required("full_name", &self.full_name, 255)?,
            email: Email::parse(&self.email)?,
            address: required("address", &self.address, 1000)?,
            city: required("city", &self.city, 255)?,
            pin_code: PinCode::parse(&self.pin_code)?,
            state: required("state", &self.state, 255)?,
            mobile: MobileNumber::parse(&self.mobile)?,
        })
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ContactError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ContactError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ContactError::TooLong { field, max });
    }
    Ok(value.to_owned())
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: OrderNumber,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub order_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub total: Price,
    pub shipping_status: ShippingStatus,
}

/// One line of an order, with product name and seller for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub seller: String,
    pub quantity: i32,
    pub price: Price,
    pub total: Price,
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

impl OrderWithLines {
    /// Distinct seller names across the lines, in first-seen order.
    #[must_use]
    pub fn sellers(&self) -> Vec<&str> {
        let mut sellers: Vec<&str> = Vec::new();
        for line in &self.items {
            if !line.seller.is_empty() && !sellers.contains(&line.seller.as_str()) {
                sellers.push(&line.seller);
            }
        }
        sellers
    }
}

/// Input for creating the order shell. Total starts at zero.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub shipping: ShippingDetails,
    pub payment_method: PaymentMethod,
}

/// Input for creating an order line.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub seller: String,
    pub quantity: i32,
    pub price: Price,
    pub total: Price,
}

impl NewOrderLine {
    /// Snapshot the product's current price into a line.
    #[must_use]
    pub fn snapshot(order_id: OrderId, product: &Product, quantity: i32) -> Self {
        Self {
            order_id,
            product_id: product.id,
            product_name: product.name.clone(),
            seller: product.seller.clone(),
            quantity,
            price: product.price,
            total: product.price.times(quantity),
        }
    }
}

/// Sum of line totals.
#[must_use]
pub fn order_total(lines: &[OrderLine]) -> Price {
    lines.iter().map(|line| line.total).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checkout() -> CheckoutRequest {
        CheckoutRequest {
            full_name: " Asha Rao ".to_string(),
            email: "asha@example.com".to_string(),
            address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            pin_code: "560001".to_string(),
            state: "Karnataka".to_string(),
            mobile: "9876543210".to_string(),
            payment_method: PaymentMethod::Upi,
        }
    }

    fn line(seller: &str, total: i64) -> OrderLine {
        OrderLine {
            id: OrderLineId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            product_name: "Tee".to_string(),
            seller: seller.to_string(),
            quantity: 1,
            price: Price::from_paise(total),
            total: Price::from_paise(total),
        }
    }

    #[test]
    fn test_checkout_validates_and_trims() {
        let details = checkout().validate().unwrap();
        assert_eq!(details.full_name, "Asha Rao");
        assert_eq!(details.pin_code.as_str(), "560001");
    }

    #[test]
    fn test_checkout_rejects_blank_required_field() {
        let mut request = checkout();
        request.city = "   ".to_string();
        assert_eq!(
            request.validate(),
            Err(ContactError::Empty { field: "city" })
        );
    }

    #[test]
    fn test_checkout_rejects_bad_pin_code() {
        let mut request = checkout();
        request.pin_code = "5600".to_string();
        assert_eq!(request.validate(), Err(ContactError::InvalidPinCode));
    }

    #[test]
    fn test_order_total_sums_lines() {
        let lines = vec![line("a", 1000), line("b", 2550)];
        assert_eq!(order_total(&lines), Price::from_paise(3550));
        assert_eq!(order_total(&[]), Price::ZERO);
    }

    #[test]
    fn test_sellers_are_deduplicated() {
        let order = OrderWithLines {
            order: Order {
                id: OrderId::new(1),
                user_id: UserId::new(1),
                order_number: OrderNumber::parse("ABCD2345").unwrap(),
                shipping: checkout().validate().unwrap(),
                order_date: Utc::now(),
                payment_method: PaymentMethod::Upi,
                total: Price::ZERO,
                shipping_status: ShippingStatus::NotShipped,
            },
            items: vec![line("Acme", 1), line("", 1), line("Acme", 1), line("Zenith", 1)],
        };
        assert_eq!(order.sellers(), vec!["Acme", "Zenith"]);
    }
}
