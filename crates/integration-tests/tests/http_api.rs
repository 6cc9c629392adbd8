//! HTTP routes: status codes, JSON bodies and session auth.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use dac_retail_core::{Price, ProductId};
use dac_retail_integration_tests::TestApp;

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Sign in as `user_id` and return the session cookie.
async fn login(router: &Router, user_id: i32) -> String {
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/test/login/{user_id}"))
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

fn checkout_body() -> Value {
    json!({
        "full_name": "Asha Rao",
        "email": "asha@example.com",
        "address": "12 MG Road",
        "city": "Bengaluru",
        "pin_code": "560001",
        "state": "Karnataka",
        "mobile": "9876543210",
        "payment_method": "cash_on_delivery"
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let router = app.router();

    let (status, _) = send(&router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&router, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_is_public() {
    let app = TestApp::new();
    let product = app.seed_product("Shirt", Price::from_paise(129_900), 4).await;
    let router = app.router();

    let (status, body) = send(&router, Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/api/products/{}", product.id);
    let (status, body) = send(&router, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Shirt");
    assert_eq!(body["price"], "1299.00");

    let uri = format!("/api/categories/{}/products", product.category_id);
    let (status, body) = send(&router, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["name"], "General");
    assert_eq!(body["products"][0]["id"], product.id.as_i32());

    let (status, body) = send(&router, Method::GET, "/api/products/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_cart_requires_login() {
    let app = TestApp::new();
    let router = app.router();

    let (status, body) = send(&router, Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "login required");

    let (status, _) = send(&router, Method::POST, "/api/orders", None, Some(checkout_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_over_http() {
    let app = TestApp::new();
    let product = app.seed_product("Shirt", Price::from_paise(1_000), 5).await;
    let router = app.router();
    let cookie = login(&router, 1).await;
    let line = format!("/api/cart/items/{}", product.id);

    let (status, body) = send(
        &router,
        Method::POST,
        &line,
        Some(&cookie),
        Some(json!({ "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], 2);

    // No body adds one more
    let (status, body) = send(&router, Method::POST, &line, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], 3);

    let (status, body) = send(&router, Method::GET, "/api/cart", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart_total"], "30.00");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/orders",
        Some(&cookie),
        Some(checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["total"], "30.00");
    assert_eq!(body["order"]["shipping_status"], "not_shipped");
    assert_eq!(body["order"]["items"][0]["quantity"], 3);
    let number = body["order"]["order_number"].as_str().unwrap().to_owned();
    assert_eq!(app.stock(product.id).await, 2);

    let uri = format!("/api/orders/{number}");
    let (status, body) = send(&router, Method::GET, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Asha Rao");

    let cancel = format!("/api/orders/{number}/cancel");
    let (status, body) = send(&router, Method::POST, &cancel, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shipping_status"], "cancelled");
    assert_eq!(app.stock(product.id).await, 5);

    let (status, body) = send(&router, Method::POST, &cancel, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "order cannot be cancelled");
}

#[tokio::test]
async fn test_insufficient_stock_is_conflict() {
    let app = TestApp::new();
    let product = app.seed_product("Shirt", Price::from_paise(1_000), 1).await;
    let router = app.router();
    let cookie = login(&router, 1).await;

    let line = format!("/api/cart/items/{}", product.id);
    send(
        &router,
        Method::POST,
        &line,
        Some(&cookie),
        Some(json!({ "quantity": 2 })),
    )
    .await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/orders",
        Some(&cookie),
        Some(checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["product_id"], product.id.as_i32());
    assert_eq!(body["requested"], 2);
    assert_eq!(body["available"], 1);
    assert_eq!(app.stock(product.id).await, 1);
}

#[tokio::test]
async fn test_bad_input_is_bad_request() {
    let app = TestApp::new();
    let product = app.seed_product("Shirt", Price::from_paise(1_000), 5).await;
    let router = app.router();
    let cookie = login(&router, 1).await;

    let line = format!("/api/cart/items/{}", product.id);
    let (status, _) = send(
        &router,
        Method::POST,
        &line,
        Some(&cookie),
        Some(json!({ "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Empty cart
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/orders",
        Some(&cookie),
        Some(checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cart is empty");

    let (status, _) = send(
        &router,
        Method::PUT,
        "/api/payments",
        Some(&cookie),
        Some(json!({ "payment_method": "cash_on_delivery" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_orders_are_private() {
    let app = TestApp::new();
    let product = app.seed_product("Shirt", Price::from_paise(1_000), 5).await;
    let router = app.router();
    let owner = login(&router, 1).await;
    let stranger = login(&router, 2).await;

    let line = format!("/api/cart/items/{}", product.id);
    send(&router, Method::POST, &line, Some(&owner), None).await;
    let (_, body) = send(
        &router,
        Method::POST,
        "/api/orders",
        Some(&owner),
        Some(checkout_body()),
    )
    .await;
    let number = body["order"]["order_number"].as_str().unwrap().to_owned();

    let uri = format!("/api/orders/{number}");
    let (status, _) = send(&router, Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&router, Method::GET, "/api/orders", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(&router, Method::GET, "/api/orders/not-real", Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_cart_line() {
    let app = TestApp::new();
    let product = app.seed_product("Shirt", Price::from_paise(1_000), 5).await;
    let router = app.router();
    let cookie = login(&router, 1).await;
    let line = format!("/api/cart/items/{}", product.id);
    send(&router, Method::POST, &line, Some(&cookie), None).await;

    let (status, _) = send(&router, Method::DELETE, &line, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&router, Method::DELETE, &line, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = format!("/api/cart/items/{}", ProductId::new(999));
    let (status, _) = send(&router, Method::GET, &missing, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payments_and_shipments() {
    let app = TestApp::new();
    let router = app.router();
    let cookie = login(&router, 1).await;

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/payments",
        Some(&cookie),
        Some(json!({ "payment_method": "upi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_method"], "upi");

    let (status, body) = send(&router, Method::GET, "/api/payments", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&router, Method::GET, "/api/shipments", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreadable_requests_get_json_errors() {
    let app = TestApp::new();
    let product = app.seed_product("Shirt", Price::from_paise(1_000), 5).await;
    let router = app.router();
    let cookie = login(&router, 1).await;
    let line = format!("/api/cart/items/{}", product.id);
    send(&router, Method::POST, &line, Some(&cookie), None).await;

    let mut body = checkout_body();
    body["payment_method"] = json!("bitcoin");
    let (status, body) = send(&router, Method::POST, "/api/orders", Some(&cookie), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(app.stock(product.id).await, 5);

    let (status, body) = send(&router, Method::GET, "/api/products/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &router,
        Method::POST,
        &line,
        Some(&cookie),
        Some(json!({ "quantity": "many" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/payments",
        Some(&cookie),
        Some(json!({ "payment_method": "cheque" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_cart_quantity_overflow_is_bad_request() {
    let app = TestApp::new();
    let product = app.seed_product("Shirt", Price::from_paise(1_000), 5).await;
    let router = app.router();
    let cookie = login(&router, 1).await;
    let line = format!("/api/cart/items/{}", product.id);
    let max = json!({ "quantity": i32::MAX });

    let (status, _) = send(&router, Method::POST, &line, Some(&cookie), Some(max.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&router, Method::POST, &line, Some(&cookie), Some(max)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_request_id_is_echoed_or_assigned() {
    let app = TestApp::new();
    let router = app.router();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-42")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "edge-42");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let assigned = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(assigned.len(), 36);
}

#[tokio::test]
async fn test_tampered_session_cookie_is_unauthorized() {
    let app = TestApp::new();
    let router = app.router();
    let cookie = login(&router, 1).await;

    let (status, _) = send(&router, Method::GET, "/api/payments", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    // Replace the last character of the session id
    let mut tampered = cookie.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });
    let (status, body) = send(&router, Method::GET, "/api/payments", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "login required");
}

#[tokio::test]
async fn test_home_and_profile() {
    let app = TestApp::new();
    app.seed_product("Shirt", Price::from_paise(1_000), 5).await;
    app.seed_product("Socks", Price::from_paise(300), 5).await;
    let router = app.router();

    let (status, body) = send(&router, Method::GET, "/api/home", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"].as_array().unwrap().len(), 2);
    assert_eq!(body["categories"][0]["name"], "General");

    let (status, _) = send(&router, Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = login(&router, 3).await;
    let (status, body) = send(&router, Method::GET, "/api/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "user3@example.com");
}
