//! Races against `PgStore`, where row locks rather than a process-wide mutex
//! keep placements and cancellations apart.
//!
//! Ignored by default. Point `DATABASE_URL` at a disposable database:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/dac_retail_test \
//!     cargo test -p dac-retail-integration-tests --test postgres_store -- --ignored
//! ```
//!
//! Every run tags its products and user ids with the current time, so runs
//! can share a database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;

use dac_retail_core::{PaymentMethod, Price, ProductId, UserId};
use dac_retail_integration_tests::{RecordingDispatcher, RecordingInvoices, checkout, new_product};
use dac_retail_storefront::db::{self, PgStore};
use dac_retail_storefront::models::Product;
use dac_retail_storefront::services::{CommerceError, OrderPolicy};
use dac_retail_storefront::state::AppState;

struct PgApp {
    state: AppState,
    tag: i32,
}

impl PgApp {
    async fn connect() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must name a test database");
        let pool = db::create_pool(&SecretString::from(url))
            .await
            .expect("connect to DATABASE_URL");
        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .expect("run storefront migrations");

        let state = AppState::new(
            Arc::new(PgStore::new(pool)),
            Arc::new(RecordingDispatcher::default()),
            Arc::new(RecordingInvoices::default()),
            OrderPolicy::default(),
        );
        let tag = i32::try_from(Utc::now().timestamp_micros().rem_euclid(100_000_000)).unwrap();
        Self { state, tag }
    }

    fn user(&self, n: i32) -> UserId {
        UserId::new(self.tag * 16 + n)
    }

    async fn seed_product(&self, name: &str, stock: i32) -> Product {
        let category = self
            .state
            .catalog()
            .upsert_category("Postgres Races")
            .await
            .unwrap();
        let name = format!("{name} {}", self.tag);
        self.state
            .catalog()
            .upsert_product(&new_product(category.id, &name, Price::from_paise(10_000), stock))
            .await
            .unwrap()
    }

    async fn stock(&self, product: ProductId) -> i32 {
        self.state
            .catalog()
            .get_product(product)
            .await
            .unwrap()
            .quantity_available
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_last_unit_has_exactly_one_winner() {
    let app = PgApp::connect().await;
    let product = app.seed_product("Last Tee", 1).await;
    let alice = app.user(1);
    let bob = app.user(2);
    app.state.cart().add_line(alice, product.id, 1).await.unwrap();
    app.state.cart().add_line(bob, product.id, 1).await.unwrap();

    let alice_request = checkout(alice, PaymentMethod::Upi);
    let bob_request = checkout(bob, PaymentMethod::Upi);
    let (a, b) = tokio::join!(
        app.state.orders().place_order(alice, &alice_request),
        app.state.orders().place_order(bob, &bob_request),
    );

    let outcomes = [a, b];
    let placed = outcomes.iter().filter(|r| r.is_ok()).count();
    let short = outcomes
        .iter()
        .filter(|r| matches!(r, Err(CommerceError::InsufficientStock { available: 0, .. })))
        .count();
    assert_eq!((placed, short), (1, 1));
    assert_eq!(app.stock(product.id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_many_buyers_never_oversell() {
    let app = PgApp::connect().await;
    let product = app.seed_product("Drop Sneaker", 3).await;

    let mut tasks = Vec::new();
    for n in 1..=8 {
        let user = app.user(n);
        app.state.cart().add_line(user, product.id, 1).await.unwrap();
        let state = app.state.clone();
        tasks.push(tokio::spawn(async move {
            state
                .orders()
                .place_order(user, &checkout(user, PaymentMethod::Upi))
                .await
        }));
    }

    let mut placed = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => placed += 1,
            Err(CommerceError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(placed, 3);
    assert_eq!(app.stock(product.id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_concurrent_cancellations_credit_stock_once() {
    let app = PgApp::connect().await;
    let user = app.user(1);
    let product = app.seed_product("Cap", 5).await;
    app.state.cart().add_line(user, product.id, 2).await.unwrap();
    let placed = app
        .state
        .orders()
        .place_order(user, &checkout(user, PaymentMethod::Upi))
        .await
        .unwrap();
    let number = placed.order.order.order_number;
    assert_eq!(app.stock(product.id).await, 3);

    let (a, b) = tokio::join!(
        app.state.orders().cancel_order(user, &number),
        app.state.orders().cancel_order(user, &number),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(CommerceError::InvalidState(_))))
    );
    assert_eq!(app.stock(product.id).await, 5);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_cart_overflow_is_rejected_before_the_write() {
    let app = PgApp::connect().await;
    let user = app.user(1);
    let product = app.seed_product("Bulk Socks", 5).await;
    app.state.cart().add_line(user, product.id, i32::MAX).await.unwrap();

    let err = app
        .state
        .cart()
        .add_line(user, product.id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::Validation(_)));
}
