//! Integration tests for DAC Retail.
//!
//! The workflow and HTTP tests run the real services and router against the
//! in-memory store, with recording fakes in place of the email queue and the
//! invoice renderer.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dac-retail-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_workflow` - Placement, cancellation, side effects
//! - `cart` - Cart lines
//! - `concurrency` - Racing placements for the last units
//! - `shipments` - Shipment lifecycle and payment profiles
//! - `http_api` - Routes, status codes and session auth
//! - `postgres_store` - The concurrency races against `PgStore`; ignored
//!   unless run with `--ignored` and a `DATABASE_URL`

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{
    Router,
    extract::Path,
    http::StatusCode,
    middleware::from_fn,
    routing::post,
};
use chrono::NaiveDate;
use secrecy::SecretString;
use tower_sessions::{MemoryStore as SessionStore, Session};

use dac_retail_core::{Email, PaymentMethod, Price, ProductId, UserId};
use dac_retail_storefront::db::MemoryStore;
use dac_retail_storefront::middleware::session::session_layer;
use dac_retail_storefront::middleware::{request_id_middleware, session_key, set_current_user};
use dac_retail_storefront::models::{
    CheckoutRequest, CurrentUser, NewProduct, OrderWithLines, Product,
};
use dac_retail_storefront::routes;
use dac_retail_storefront::services::{
    InvoiceError, InvoiceRef, InvoiceRenderer, Notification, NotificationDispatcher, OrderPolicy,
    Recipient,
};
use dac_retail_storefront::state::AppState;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Dispatcher that keeps every notification it is given.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<(Recipient, Notification)>>,
}

impl RecordingDispatcher {
    /// Everything enqueued so far, in order.
    pub fn sent(&self) -> Vec<(Recipient, Notification)> {
        lock(&self.sent).clone()
    }

    /// Notification kinds enqueued so far, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        lock(&self.sent).iter().map(|(_, n)| n.kind()).collect()
    }

    /// Products named by low-stock alerts, with the stock they reported.
    pub fn low_stock_alerts(&self) -> Vec<(ProductId, i32)> {
        lock(&self.sent)
            .iter()
            .filter_map(|(recipient, notification)| match notification {
                Notification::LowStockAlert {
                    product_id,
                    quantity_available,
                    ..
                } => {
                    assert_eq!(*recipient, Recipient::Operations);
                    Some((*product_id, *quantity_available))
                }
                _ => None,
            })
            .collect()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn enqueue(&self, recipient: Recipient, notification: Notification) {
        lock(&self.sent).push((recipient, notification));
    }
}

/// Invoice renderer that records order numbers, or fails every call.
#[derive(Debug, Default)]
pub struct RecordingInvoices {
    rendered: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingInvoices {
    /// A renderer whose every call fails.
    pub fn failing() -> Self {
        Self {
            rendered: Mutex::default(),
            fail: true,
        }
    }

    /// Order numbers rendered so far.
    pub fn rendered(&self) -> Vec<String> {
        lock(&self.rendered).clone()
    }
}

#[async_trait]
impl InvoiceRenderer for RecordingInvoices {
    async fn render(&self, order: &OrderWithLines) -> Result<InvoiceRef, InvoiceError> {
        if self.fail {
            return Err(InvoiceError::Io(std::io::Error::other("disk full")));
        }
        let number = order.order.order_number.to_string();
        lock(&self.rendered).push(number.clone());
        Ok(InvoiceRef {
            path: format!("invoices/{number}_invoice.html").into(),
        })
    }
}

/// Services wired to the in-memory store and recording fakes.
pub struct TestApp {
    pub store: MemoryStore,
    pub notifier: Arc<RecordingDispatcher>,
    pub invoices: Arc<RecordingInvoices>,
    pub state: AppState,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_invoices(RecordingInvoices::default())
    }

    pub fn with_invoices(invoices: RecordingInvoices) -> Self {
        let store = MemoryStore::new();
        let notifier = Arc::new(RecordingDispatcher::default());
        let invoices = Arc::new(invoices);
        let state = AppState::new(
            Arc::new(store.clone()),
            notifier.clone(),
            invoices.clone(),
            OrderPolicy::default(),
        );
        Self {
            store,
            notifier,
            invoices,
            state,
        }
    }

    /// Add a product to a "General" category.
    ///
    /// # Panics
    ///
    /// Panics if the catalog rejects the product.
    pub async fn seed_product(&self, name: &str, price: Price, stock: i32) -> Product {
        let category = self
            .state
            .catalog()
            .upsert_category("General")
            .await
            .expect("seed category");
        self.state
            .catalog()
            .upsert_product(&new_product(category.id, name, price, stock))
            .await
            .expect("seed product")
    }

    /// Put `quantity` of `product` into `user`'s cart.
    ///
    /// # Panics
    ///
    /// Panics if the cart rejects the line.
    pub async fn add_to_cart(&self, user: UserId, product: ProductId, quantity: i32) {
        self.state
            .cart()
            .add_line(user, product, quantity)
            .await
            .expect("add to cart");
    }

    /// Current stock of a product.
    ///
    /// # Panics
    ///
    /// Panics if the product does not exist.
    pub async fn stock(&self, product: ProductId) -> i32 {
        self.store
            .snapshot()
            .await
            .stock(product)
            .expect("product exists")
    }

    /// The storefront router with an in-memory signed session layer, the
    /// request-id middleware and a `POST /test/login/{user_id}` route standing
    /// in for the account service.
    pub fn router(&self) -> Router {
        let secret = SecretString::from("kT9#vQ2$mX7!pL4@wR8%zN3^bH6&cJ1*");
        let sessions = session_layer(SessionStore::default(), session_key(&secret), false);

        routes::routes()
            .route("/test/login/{user_id}", post(login))
            .layer(sessions)
            .layer(from_fn(request_id_middleware))
            .with_state(self.state.clone())
    }
}

async fn login(session: Session, Path(user_id): Path<i32>) -> StatusCode {
    let user = CurrentUser {
        id: UserId::new(user_id),
        email: customer_email(user_id),
    };
    match set_current_user(&session, &user).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn customer_email(user_id: i32) -> Email {
    Email::parse(&format!("user{user_id}@example.com")).expect("valid email")
}

/// A product with the required fields filled in.
pub fn new_product(
    category_id: dac_retail_core::CategoryId,
    name: &str,
    price: Price,
    stock: i32,
) -> NewProduct {
    NewProduct {
        category_id,
        name: name.to_owned(),
        description: format!("{name} description"),
        price,
        quantity_available: stock,
        image: None,
        seller: "Loom House".to_owned(),
        brand_name: "Loom".to_owned(),
        listing_date: NaiveDate::from_ymd_opt(2026, 1, 15).expect("valid date"),
        manufacturing_date: None,
        expiry_date: None,
        highlights: String::new(),
        color: None,
        fabric: None,
        sizes: Vec::new(),
    }
}

/// A valid checkout form for `user`.
pub fn checkout(user: UserId, payment_method: PaymentMethod) -> CheckoutRequest {
    CheckoutRequest {
        full_name: "Asha Rao".to_owned(),
        email: customer_email(user.as_i32()).to_string(),
        address: "12 MG Road".to_owned(),
        city: "Bengaluru".to_owned(),
        pin_code: "560001".to_owned(),
        state: "Karnataka".to_owned(),
        mobile: "9876543210".to_owned(),
        payment_method,
    }
}
