//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::Store;
use crate::services::{
    CartService, CatalogService, InvoiceRenderer, NotificationDispatcher, OrderPolicy,
    OrderService, PaymentService, ShipmentService,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The store, notification
/// dispatcher and invoice renderer are trait objects so the same router runs
/// against `PostgreSQL` in production and the in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    catalog: CatalogService,
    cart: CartService,
    orders: OrderService,
    payments: PaymentService,
    shipments: ShipmentService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence backend
    /// * `notifier` - Queue for outgoing notifications
    /// * `invoices` - Invoice renderer used after placement
    /// * `policy` - Order workflow tunables
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn NotificationDispatcher>,
        invoices: Arc<dyn InvoiceRenderer>,
        policy: OrderPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(store.clone()),
                cart: CartService::new(store.clone()),
                orders: OrderService::new(store.clone(), notifier, invoices, policy),
                payments: PaymentService::new(store.clone()),
                shipments: ShipmentService::new(store.clone()),
                store,
            }),
        }
    }

    /// Get a reference to the persistence backend.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.inner.payments
    }

    #[must_use]
    pub fn shipments(&self) -> &ShipmentService {
        &self.inner.shipments
    }
}
