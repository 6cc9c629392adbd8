//! Storage traits.
//!
//! A [`Store`] hands out [`UnitOfWork`]s. Everything done through one unit
//! of work commits atomically on [`UnitOfWork::commit`]; dropping it without
//! committing rolls everything back.

use async_trait::async_trait;

use dac_retail_core::{
    CartId, CategoryId, DeliveryStatus, OrderId, OrderNumber, Price, ProductId, ShipmentId,
    ShippingStatus, UserId,
};

use super::RepositoryError;
use crate::models::{
    BillingDetails, Cart, CartLine, Category, NewOrder, NewOrderLine, NewProduct, NewShipment,
    Order, OrderLine, PaymentMethodUpdate, PaymentProfile, Product, Shipment,
};

/// Source of units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// One atomic transaction over every entity.
#[async_trait]
pub trait UnitOfWork: CatalogStore + CartStore + OrderStore + PaymentStore + ShipmentStore {
    /// Make every change visible at once.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Categories, products and stock.
#[async_trait]
pub trait CatalogStore: Send {
    async fn list_categories(&mut self) -> Result<Vec<Category>, RepositoryError>;

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// Insert a category by name, or return the existing one.
    async fn upsert_category(&mut self, name: &str) -> Result<Category, RepositoryError>;

    /// All products, or those of one category, ordered by id.
    async fn list_products(
        &mut self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert or replace the product named `name` in its category, sizes
    /// included.
    async fn upsert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Lock the given products against concurrent stock changes until the
    /// unit of work ends. Locks are taken in ascending id order. Unknown ids
    /// are skipped.
    async fn lock_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Add `delta` to a product's stock and return the new quantity.
    ///
    /// Fails with [`RepositoryError::Constraint`] if stock would go negative
    /// and [`RepositoryError::NotFound`] for an unknown product.
    async fn adjust_stock(&mut self, id: ProductId, delta: i32) -> Result<i32, RepositoryError>;
}

/// Carts and cart lines.
#[async_trait]
pub trait CartStore: Send {
    async fn find_cart(&mut self, user: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Like [`find_cart`](Self::find_cart), but locks the cart row.
    async fn lock_cart(&mut self, user: UserId) -> Result<Option<Cart>, RepositoryError>;

    async fn get_or_create_cart(&mut self, user: UserId) -> Result<Cart, RepositoryError>;

    /// Lines of a cart in the order they were first added.
    async fn cart_lines(&mut self, cart: CartId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Create the line with `quantity`, or add `quantity` to an existing one.
    async fn add_to_line(
        &mut self,
        cart: CartId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError>;

    /// Returns whether a line was removed.
    async fn remove_line(&mut self, cart: CartId, product: ProductId)
    -> Result<bool, RepositoryError>;

    /// Delete every line. The cart itself stays.
    async fn clear_cart(&mut self, cart: CartId) -> Result<(), RepositoryError>;
}

/// Orders and order lines.
#[async_trait]
pub trait OrderStore: Send {
    /// Fails with [`RepositoryError::Conflict`] if the order number is taken.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError>;

    async fn insert_order_line(&mut self, line: &NewOrderLine)
    -> Result<OrderLine, RepositoryError>;

    async fn order_lines(&mut self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;

    async fn set_order_total(&mut self, order: OrderId, total: Price)
    -> Result<(), RepositoryError>;

    async fn find_order(&mut self, number: &OrderNumber)
    -> Result<Option<Order>, RepositoryError>;

    /// Like [`find_order`](Self::find_order), but locks the order row.
    async fn lock_order(&mut self, number: &OrderNumber)
    -> Result<Option<Order>, RepositoryError>;

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// A user's orders, most recent first.
    async fn list_orders(&mut self, user: UserId) -> Result<Vec<Order>, RepositoryError>;

    async fn earliest_order(&mut self, user: UserId) -> Result<Option<Order>, RepositoryError>;

    async fn set_shipping_status(
        &mut self,
        order: OrderId,
        status: ShippingStatus,
    ) -> Result<(), RepositoryError>;
}

/// Payment profiles.
#[async_trait]
pub trait PaymentStore: Send {
    async fn list_payment_profiles(
        &mut self,
        user: UserId,
    ) -> Result<Vec<PaymentProfile>, RepositoryError>;

    /// Create a profile with `billing` unless the user already has one.
    /// Returns whether a profile was created.
    async fn insert_payment_profile_if_absent(
        &mut self,
        user: UserId,
        billing: &BillingDetails,
    ) -> Result<bool, RepositoryError>;

    /// Set the payment method on the user's profile, creating the profile
    /// with `billing` if absent.
    async fn save_payment_method(
        &mut self,
        user: UserId,
        billing: Option<&BillingDetails>,
        method: &PaymentMethodUpdate,
    ) -> Result<PaymentProfile, RepositoryError>;
}

/// Shipments.
#[async_trait]
pub trait ShipmentStore: Send {
    /// Fails with [`RepositoryError::Conflict`] if the order already has one.
    async fn insert_shipment(&mut self, shipment: &NewShipment)
    -> Result<Shipment, RepositoryError>;

    async fn find_shipment(&mut self, order: OrderId) -> Result<Option<Shipment>, RepositoryError>;

    async fn set_delivery_status(
        &mut self,
        shipment: ShipmentId,
        status: DeliveryStatus,
    ) -> Result<(), RepositoryError>;

    /// Shipments of a user's orders, most recently shipped first.
    async fn list_shipments(&mut self, user: UserId) -> Result<Vec<Shipment>, RepositoryError>;
}
