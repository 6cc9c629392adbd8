//! Shipment lifecycle and payment profiles.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;

use dac_retail_core::{
    CardType, Courier, DeliveryStatus, OrderNumber, PaymentMethod, Price, ShippingStatus, UserId,
};
use dac_retail_integration_tests::{TestApp, checkout};
use dac_retail_storefront::models::PaymentMethodRequest;
use dac_retail_storefront::services::CommerceError;

const USER: UserId = UserId::new(3);

async fn placed_order(app: &TestApp) -> OrderNumber {
    let product = app.seed_product("Kurta", Price::from_paise(79_900), 10).await;
    app.add_to_cart(USER, product.id, 1).await;
    app.state
        .orders()
        .place_order(USER, &checkout(USER, PaymentMethod::CashOnDelivery))
        .await
        .unwrap()
        .order
        .order
        .order_number
}

fn expected() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).unwrap()
}

// =============================================================================
// Shipments
// =============================================================================

#[tokio::test]
async fn test_shipment_moves_forward_to_delivered() {
    let app = TestApp::new();
    let number = placed_order(&app).await;
    let shipments = app.state.shipments();

    let shipment = shipments
        .create_shipment(&number, Courier::Bluedart, "  BD998877  ", expected())
        .await
        .unwrap();
    assert_eq!(shipment.tracking_id, "BD998877");
    assert_eq!(shipment.delivery_status, DeliveryStatus::InTransit);
    let order = app.state.orders().get_order(USER, &number).await.unwrap();
    assert_eq!(order.order.shipping_status, ShippingStatus::Shipped);

    shipments
        .advance_shipment(&number, DeliveryStatus::OutForDelivery)
        .await
        .unwrap();
    let delivered = shipments
        .advance_shipment(&number, DeliveryStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.delivery_status, DeliveryStatus::Delivered);

    let order = app.state.orders().get_order(USER, &number).await.unwrap();
    assert_eq!(order.order.shipping_status, ShippingStatus::Delivered);
}

#[tokio::test]
async fn test_shipment_cannot_move_backwards() {
    let app = TestApp::new();
    let number = placed_order(&app).await;
    let shipments = app.state.shipments();
    shipments
        .create_shipment(&number, Courier::IndiaPost, "IP1", expected())
        .await
        .unwrap();
    shipments
        .advance_shipment(&number, DeliveryStatus::OutForDelivery)
        .await
        .unwrap();

    for status in [DeliveryStatus::InTransit, DeliveryStatus::OutForDelivery] {
        let err = shipments
            .advance_shipment(&number, status)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InvalidState(_)));
    }
}

#[tokio::test]
async fn test_order_ships_once() {
    let app = TestApp::new();
    let number = placed_order(&app).await;
    let shipments = app.state.shipments();
    shipments
        .create_shipment(&number, Courier::Delhivery, "DL1", expected())
        .await
        .unwrap();

    let err = shipments
        .create_shipment(&number, Courier::Delhivery, "DL2", expected())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InvalidState(_)));
}

#[tokio::test]
async fn test_cancelled_order_cannot_ship() {
    let app = TestApp::new();
    let number = placed_order(&app).await;
    app.state.orders().cancel_order(USER, &number).await.unwrap();

    let err = app
        .state
        .shipments()
        .create_shipment(&number, Courier::Other, "X1", expected())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InvalidState(_)));
}

#[tokio::test]
async fn test_advance_without_shipment_is_not_found() {
    let app = TestApp::new();
    let number = placed_order(&app).await;

    let err = app
        .state
        .shipments()
        .advance_shipment(&number, DeliveryStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::NotFound(_)));
}

#[tokio::test]
async fn test_shipments_listed_for_their_owner() {
    let app = TestApp::new();
    let number = placed_order(&app).await;
    app.state
        .shipments()
        .create_shipment(&number, Courier::Bluedart, "BD1", expected())
        .await
        .unwrap();

    let views = app.state.shipments().list_for_user(USER).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].order_number, number);
    assert_eq!(views[0].recipient, "Asha Rao");
    assert_eq!(views[0].items[0].product_name, "Kurta");
    assert_eq!(views[0].total, Price::from_paise(79_900));

    let others = app
        .state
        .shipments()
        .list_for_user(UserId::new(99))
        .await
        .unwrap();
    assert!(others.is_empty());
}

// =============================================================================
// Payment profiles
// =============================================================================

#[tokio::test]
async fn test_profile_created_from_first_order_only() {
    let app = TestApp::new();
    placed_order(&app).await;

    let product = app.seed_product("Stole", Price::from_paise(45_000), 10).await;
    app.add_to_cart(USER, product.id, 1).await;
    let mut second = checkout(USER, PaymentMethod::Upi);
    second.address = "99 Park Street".to_owned();
    second.city = "Kolkata".to_owned();
    app.state.orders().place_order(USER, &second).await.unwrap();

    let profiles = app.state.payments().list_profiles(USER).await.unwrap();
    assert_eq!(profiles.len(), 1);
    let billing = profiles[0].billing.as_ref().unwrap();
    assert_eq!(billing.address, "12 MG Road");
    assert_eq!(billing.city, "Bengaluru");
    assert_eq!(billing.pin_code.as_str(), "560001");
    assert!(profiles[0].payment_method.is_none());
}

#[tokio::test]
async fn test_save_card_keeps_only_last_four_digits() {
    let app = TestApp::new();
    placed_order(&app).await;

    let profile = app
        .state
        .payments()
        .save_payment_method(
            USER,
            &PaymentMethodRequest {
                payment_method: PaymentMethod::DebitCreditCard,
                card_type: Some(CardType::Visa),
                card_number: Some("4111 1111 1111 1234".to_owned()),
            },
        )
        .await
        .unwrap();

    assert_eq!(profile.payment_method, Some(PaymentMethod::DebitCreditCard));
    assert_eq!(profile.card_type, Some(CardType::Visa));
    assert_eq!(profile.card_last4.as_deref(), Some("1234"));
    assert!(profile.billing.is_some());
}

#[tokio::test]
async fn test_switching_to_upi_clears_card() {
    let app = TestApp::new();
    placed_order(&app).await;
    let payments = app.state.payments();
    payments
        .save_payment_method(
            USER,
            &PaymentMethodRequest {
                payment_method: PaymentMethod::DebitCreditCard,
                card_type: Some(CardType::Rupay),
                card_number: Some("6521123412341234".to_owned()),
            },
        )
        .await
        .unwrap();

    let profile = payments
        .save_payment_method(
            USER,
            &PaymentMethodRequest {
                payment_method: PaymentMethod::Upi,
                card_type: None,
                card_number: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(profile.payment_method, Some(PaymentMethod::Upi));
    assert!(profile.card_type.is_none());
    assert!(profile.card_last4.is_none());
    assert_eq!(payments.list_profiles(USER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cash_on_delivery_cannot_be_saved() {
    let app = TestApp::new();

    let err = app
        .state
        .payments()
        .save_payment_method(
            USER,
            &PaymentMethodRequest {
                payment_method: PaymentMethod::CashOnDelivery,
                card_type: None,
                card_number: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::Validation(_)));
    assert!(app.state.payments().list_profiles(USER).await.unwrap().is_empty());
}
