//! Order placement and cancellation.
//!
//! Placement converts the user's cart into an order in one unit of work:
//!
//! 1. Lock the cart and every product it references (ascending id order)
//! 2. Check every line against current stock; fail before any write
//! 3. Create the order shell and clear the cart
//! 4. Snapshot each line's price into an order line and decrement stock
//! 5. Recompute and store the order total, then commit
//!
//! After commit, side effects run best-effort: the payment profile is
//! created from the first order, a confirmation email and any low-stock
//! alerts are queued, and the invoice is rendered. None of them can fail
//! the placement.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use dac_retail_core::{OrderNumber, PaymentMethod, ProductId, ShippingStatus, UserId};

use super::CommerceError;
use super::invoice::{InvoiceRef, InvoiceRenderer};
use super::notifications::{Notification, NotificationDispatcher, Recipient};
use crate::db::{RepositoryError, Store};
use crate::models::{
    BillingDetails, CartLine, CheckoutRequest, NewOrder, NewOrderLine, Order, OrderWithLines,
    Product, ShippingDetails, order_total,
};

/// Attempts made when the transaction hits an order-number collision or a
/// serialization conflict.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 3;

/// Tunables for the order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderPolicy {
    /// Alert operations when a product's stock falls below this.
    pub low_stock_threshold: i32,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            low_stock_threshold: 2,
        }
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: OrderWithLines,
    /// Absent when rendering failed.
    pub invoice: Option<InvoiceRef>,
}

/// Stock left for a product after a placement.
struct StockLevel {
    product_id: ProductId,
    product_name: String,
    quantity_available: i32,
}

/// The order workflow.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn NotificationDispatcher>,
    invoices: Arc<dyn InvoiceRenderer>,
    policy: OrderPolicy,
}

impl OrderService {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn NotificationDispatcher>,
        invoices: Arc<dyn InvoiceRenderer>,
        policy: OrderPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            invoices,
            policy,
        }
    }

    /// Turn the user's cart into an order.
    ///
    /// # Errors
    ///
    /// - `Validation` for bad shipping details or an empty cart
    /// - `InsufficientStock` naming the first line that exceeds stock
    /// - `Persistence` if the store fails; nothing is written
    #[instrument(skip(self, request), fields(user_id = %user))]
    pub async fn place_order(
        &self,
        user: UserId,
        request: &CheckoutRequest,
    ) -> Result<PlacedOrder, CommerceError> {
        let shipping = request.validate()?;

        let mut attempt = 1;
        let (order, stock) = loop {
            match self.try_place(user, &shipping, request.payment_method).await {
                Err(CommerceError::Persistence(e))
                    if e.is_retryable() && attempt < MAX_PLACEMENT_ATTEMPTS =>
                {
                    warn!(attempt, error = %e, "Order placement conflicted, retrying");
                    attempt += 1;
                }
                result => break result?,
            }
        };

        info!(
            order_number = %order.order.order_number,
            total = %order.order.total,
            lines = order.items.len(),
            "Order placed"
        );

        self.ensure_payment_profile(user, &order.order.shipping).await;
        self.notifier.enqueue(
            Recipient::Customer(order.order.shipping.email.clone()),
            Notification::OrderConfirmation(Box::new(order.clone())),
        );
        for level in stock
            .into_iter()
            .filter(|level| level.quantity_available < self.policy.low_stock_threshold)
        {
            warn!(product_id = %level.product_id, remaining = level.quantity_available, "Low stock");
            self.notifier.enqueue(
                Recipient::Operations,
                Notification::LowStockAlert {
                    product_id: level.product_id,
                    product_name: level.product_name,
                    quantity_available: level.quantity_available,
                },
            );
        }
        let invoice = match self.invoices.render(&order).await {
            Ok(invoice) => Some(invoice),
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                error!(
                    order_number = %order.order.order_number,
                    error = %e,
                    sentry_event_id = %event_id,
                    "Invoice rendering failed"
                );
                None
            }
        };

        Ok(PlacedOrder { order, invoice })
    }

    async fn try_place(
        &self,
        user: UserId,
        shipping: &ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<(OrderWithLines, Vec<StockLevel>), CommerceError> {
        let empty_cart = || CommerceError::Validation("cart is empty".to_owned());

        let mut uow = self.store.begin().await?;
        let cart = uow.lock_cart(user).await?.ok_or_else(empty_cart)?;
        let lines = uow.cart_lines(cart.id).await?;
        if lines.is_empty() {
            return Err(empty_cart());
        }

        let ids: Vec<ProductId> = lines.iter().map(|line| line.product_id).collect();
        let products: HashMap<ProductId, Product> = uow
            .lock_products(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();
        let checked = check_stock(&lines, &products)?;

        let order = uow
            .insert_order(&NewOrder {
                user_id: user,
                order_number: OrderNumber::generate(),
                shipping: shipping.clone(),
                payment_method,
            })
            .await?;
        uow.clear_cart(cart.id).await?;

        let mut items = Vec::with_capacity(checked.len());
        let mut stock = Vec::with_capacity(checked.len());
        for (line, product) in checked {
            let item = uow
                .insert_order_line(&NewOrderLine::snapshot(order.id, product, line.quantity))
                .await?;
            let remaining = uow.adjust_stock(product.id, -line.quantity).await?;
            items.push(item);
            stock.push(StockLevel {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity_available: remaining,
            });
        }

        let total = order_total(&items);
        uow.set_order_total(order.id, total).await?;
        uow.commit().await?;

        Ok((
            OrderWithLines {
                order: Order { total, ..order },
                items,
            },
            stock,
        ))
    }

    async fn ensure_payment_profile(&self, user: UserId, shipping: &ShippingDetails) {
        let billing = BillingDetails::from(shipping);
        let result = async {
            let mut uow = self.store.begin().await?;
            let created = uow.insert_payment_profile_if_absent(user, &billing).await?;
            uow.commit().await?;
            Ok::<_, RepositoryError>(created)
        }
        .await;

        match result {
            Ok(true) => info!(user_id = %user, "Payment profile created from first order"),
            Ok(false) => {}
            Err(e) => warn!(user_id = %user, error = %e, "Failed to create payment profile"),
        }
    }

    /// Cancel an order that has not shipped, returning its stock.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist or belongs to another user
    /// - `InvalidState` unless the order is `not_shipped`
    #[instrument(skip(self), fields(user_id = %user, order_number = %number))]
    pub async fn cancel_order(
        &self,
        user: UserId,
        number: &OrderNumber,
    ) -> Result<OrderWithLines, CommerceError> {
        let mut uow = self.store.begin().await?;
        let order = uow
            .lock_order(number)
            .await?
            .filter(|order| order.user_id == user)
            .ok_or_else(|| CommerceError::not_found(format!("order {number}")))?;
        if !order.shipping_status.is_cancellable() {
            return Err(CommerceError::InvalidState(
                "order cannot be cancelled".to_owned(),
            ));
        }

        let items = uow.order_lines(order.id).await?;
        let ids: Vec<ProductId> = items.iter().map(|line| line.product_id).collect();
        uow.lock_products(&ids).await?;

        uow.set_shipping_status(order.id, ShippingStatus::Cancelled)
            .await?;
        for line in &items {
            uow.adjust_stock(line.product_id, line.quantity).await?;
        }
        uow.commit().await?;

        let order = Order {
            shipping_status: ShippingStatus::Cancelled,
            ..order
        };
        info!("Order cancelled");

        self.notifier.enqueue(
            Recipient::Customer(order.shipping.email.clone()),
            Notification::OrderCancellation(Box::new(order.clone())),
        );

        Ok(OrderWithLines { order, items })
    }

    /// The user's orders with their lines, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn list_orders(&self, user: UserId) -> Result<Vec<OrderWithLines>, CommerceError> {
        let mut uow = self.store.begin().await?;
        let mut orders = Vec::new();
        for order in uow.list_orders(user).await? {
            let items = uow.order_lines(order.id).await?;
            orders.push(OrderWithLines { order, items });
        }
        Ok(orders)
    }

    /// One of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or belongs to another
    /// user.
    pub async fn get_order(
        &self,
        user: UserId,
        number: &OrderNumber,
    ) -> Result<OrderWithLines, CommerceError> {
        let mut uow = self.store.begin().await?;
        let order = uow
            .find_order(number)
            .await?
            .filter(|order| order.user_id == user)
            .ok_or_else(|| CommerceError::not_found(format!("order {number}")))?;
        let items = uow.order_lines(order.id).await?;
        Ok(OrderWithLines { order, items })
    }
}

/// Pair every cart line with its product, failing on the first line that
/// asks for more than is in stock.
fn check_stock<'a>(
    lines: &'a [CartLine],
    products: &'a HashMap<ProductId, Product>,
) -> Result<Vec<(&'a CartLine, &'a Product)>, CommerceError> {
    lines
        .iter()
        .map(|line| {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| CommerceError::not_found(format!("product {}", line.product_id)))?;
            if !product.has_stock_for(line.quantity) {
                return Err(CommerceError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    requested: line.quantity,
                    available: product.quantity_available,
                });
            }
            Ok((line, product))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use dac_retail_core::{CartId, CartLineId, CategoryId, Price};

    use super::*;

    fn product(id: i32, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_paise(1000),
            quantity_available: stock,
            image: None,
            seller: String::new(),
            brand_name: String::new(),
            listing_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            manufacturing_date: None,
            expiry_date: None,
            highlights: String::new(),
            color: None,
            fabric: None,
            sizes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn line(product: i32, quantity: i32) -> CartLine {
        CartLine {
            id: CartLineId::new(product * 10),
            cart_id: CartId::new(1),
            product_id: ProductId::new(product),
            quantity,
        }
    }

    #[test]
    fn test_check_stock_first_failure_wins() {
        let products: HashMap<_, _> = [product(1, 0), product(2, 0)]
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let lines = [line(2, 1), line(1, 1)];

        match check_stock(&lines, &products) {
            Err(CommerceError::InsufficientStock { product_id, .. }) => {
                assert_eq!(product_id, ProductId::new(2));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_check_stock_allows_exact_quantity() {
        let products: HashMap<_, _> = [(ProductId::new(1), product(1, 3))].into_iter().collect();
        let lines = [line(1, 3)];
        let checked = check_stock(&lines, &products).unwrap();
        assert_eq!(checked.len(), 1);
    }

    #[test]
    fn test_default_low_stock_threshold() {
        assert_eq!(OrderPolicy::default().low_stock_threshold, 2);
    }
}
