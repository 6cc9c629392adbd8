//! Domain models for the storefront.
//!
//! These are validated domain types, separate from the database row types in
//! [`crate::db::postgres`]. Reads return them, the unit-of-work traits accept
//! the `New*` inputs.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;
pub mod session;
pub mod shipment;

pub use cart::{Cart, CartItemView, CartLine, CartView};
pub use catalog::{Category, NewProduct, Product, ProductSize};
pub use order::{
    CheckoutRequest, NewOrder, NewOrderLine, Order, OrderLine, OrderWithLines, ShippingDetails,
    order_total,
};
pub use payment::{
    BillingDetails, PaymentMethodError, PaymentMethodRequest, PaymentMethodUpdate, PaymentProfile,
};
pub use session::{CurrentUser, keys as session_keys};
pub use shipment::{NewShipment, ShippedItem, Shipment, ShipmentView};
