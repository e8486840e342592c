mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::entities::order::{OrderPaymentStatus, ShippingStatus};
use storefront_api::entities::payment::PaymentStatus;
use storefront_api::entities::{store, user};
use storefront_api::errors::ServiceError;
use storefront_api::services::carts::AddItemRequest;
use storefront_api::services::orders::CreateOrderRequest;
use storefront_api::services::payments::{SubmitTransactionRequest, VerifyPaymentRequest};
use storefront_api::services::Actor;
use uuid::Uuid;

/// Places and confirms an order; returns (order_id, payment_id).
async fn confirmed_order(app: &TestApp, store: &store::Model, admin: &user::Model) -> (Uuid, Uuid) {
    let product = app.create_product(store.id, dec!(100), 10).await;
    app.state
        .services
        .carts
        .add_item(
            store.id,
            AddItemRequest {
                product_id: product.id,
                quantity: 2,
            },
        )
        .await
        .unwrap();
    let address = app.create_address(store.id, true).await;
    let order = app
        .state
        .services
        .orders
        .create_from_cart(
            store.id,
            CreateOrderRequest {
                address_id: address.id,
            },
        )
        .await
        .unwrap();
    let confirmed = app
        .state
        .services
        .orders
        .confirm(order.id, admin.id)
        .await
        .unwrap();
    (order.id, confirmed.payment_id.unwrap())
}

#[tokio::test]
async fn submit_then_verify_cascades_onto_the_order() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let (order_id, payment_id) = confirmed_order(&app, &store, &admin).await;

    let payment = app
        .state
        .services
        .payments
        .submit_transaction(
            order_id,
            store.id,
            SubmitTransactionRequest {
                transaction_id: "TXN123".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Submitted);
    assert_eq!(payment.transaction_id.as_deref(), Some("TXN123"));
    assert!(payment.paid_at.is_some());

    let order = app
        .state
        .services
        .orders
        .get(order_id, Actor::Admin(admin.id))
        .await
        .unwrap();
    assert_eq!(order.payment_status, OrderPaymentStatus::Submitted);

    let verified = app
        .state
        .services
        .payments
        .verify(
            payment_id,
            admin.id,
            VerifyPaymentRequest {
                approve: true,
                notes: Some("matches bank statement".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(verified.status, PaymentStatus::Verified);
    assert_eq!(verified.verified_by, Some(admin.id));
    assert!(verified.verified_at.is_some());

    // The order-side vocabulary says "completed" for a verified payment.
    let order = app
        .state
        .services
        .orders
        .get(order_id, Actor::Admin(admin.id))
        .await
        .unwrap();
    assert_eq!(order.payment_status, OrderPaymentStatus::Completed);
    assert_eq!(
        serde_json::to_value(order.payment_status).unwrap(),
        serde_json::json!("completed")
    );
}

#[tokio::test]
async fn resubmission_overwrites_until_verified() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let (order_id, payment_id) = confirmed_order(&app, &store, &admin).await;

    let first = app
        .state
        .services
        .payments
        .submit_transaction(
            order_id,
            store.id,
            SubmitTransactionRequest {
                transaction_id: "TXN-1".to_string(),
            },
        )
        .await
        .unwrap();
    let first_paid_at = first.paid_at.unwrap();

    let second = app
        .state
        .services
        .payments
        .submit_transaction(
            order_id,
            store.id,
            SubmitTransactionRequest {
                transaction_id: "TXN-2".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(second.transaction_id.as_deref(), Some("TXN-2"));
    // paid_at marks the first submission and stays put.
    assert_eq!(second.paid_at, Some(first_paid_at));

    app.state
        .services
        .payments
        .verify(
            payment_id,
            admin.id,
            VerifyPaymentRequest {
                approve: true,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .payments
        .submit_transaction(
            order_id,
            store.id,
            SubmitTransactionRequest {
                transaction_id: "TXN-3".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn blank_transaction_id_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let (order_id, _) = confirmed_order(&app, &store, &admin).await;

    let err = app
        .state
        .services
        .payments
        .submit_transaction(
            order_id,
            store.id,
            SubmitTransactionRequest {
                transaction_id: "  ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn foreign_store_cannot_submit() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let other = app.create_store(&admin).await;
    let (order_id, _) = confirmed_order(&app, &store, &admin).await;

    let err = app
        .state
        .services
        .payments
        .submit_transaction(
            order_id,
            other.id,
            SubmitTransactionRequest {
                transaction_id: "TXN123".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn verification_requires_a_submitted_payment() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let (_, payment_id) = confirmed_order(&app, &store, &admin).await;

    let err = app
        .state
        .services
        .payments
        .verify(
            payment_id,
            admin.id,
            VerifyPaymentRequest {
                approve: true,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn rejection_fails_payment_and_order() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let (order_id, payment_id) = confirmed_order(&app, &store, &admin).await;

    app.state
        .services
        .payments
        .submit_transaction(
            order_id,
            store.id,
            SubmitTransactionRequest {
                transaction_id: "TXN-BAD".to_string(),
            },
        )
        .await
        .unwrap();

    let rejected = app
        .state
        .services
        .payments
        .verify(
            payment_id,
            admin.id,
            VerifyPaymentRequest {
                approve: false,
                notes: Some("amount mismatch".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, PaymentStatus::Failed);

    let order = app
        .state
        .services
        .orders
        .get(order_id, Actor::Admin(admin.id))
        .await
        .unwrap();
    assert_eq!(order.payment_status, OrderPaymentStatus::Failed);

    // Failed is absorbing.
    let err = app
        .state
        .services
        .payments
        .verify(
            payment_id,
            admin.id,
            VerifyPaymentRequest {
                approve: true,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn standalone_initiation_guards_its_preconditions() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;

    // Pending order: initiation rejected.
    let product = app.create_product(store.id, dec!(10), 5).await;
    app.state
        .services
        .carts
        .add_item(
            store.id,
            AddItemRequest {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();
    let address = app.create_address(store.id, true).await;
    let order = app
        .state
        .services
        .orders
        .create_from_cart(
            store.id,
            CreateOrderRequest {
                address_id: address.id,
            },
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .payments
        .initiate(order.id, admin.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Confirmation already issued the payment, so initiation conflicts.
    app.state
        .services
        .orders
        .confirm(order.id, admin.id)
        .await
        .unwrap();
    let err = app
        .state
        .services
        .payments
        .initiate(order.id, admin.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Unknown order.
    let err = app
        .state
        .services
        .payments
        .initiate(Uuid::new_v4(), admin.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn payment_reads_are_tenant_scoped() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let other = app.create_store(&admin).await;
    let (_, payment_id) = confirmed_order(&app, &store, &admin).await;

    let err = app
        .state
        .services
        .payments
        .get(payment_id, Actor::Store(other.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let own = app
        .state
        .services
        .payments
        .get(payment_id, Actor::Store(store.id))
        .await
        .unwrap();
    assert_eq!(own.id, payment_id);
    assert_eq!(own.amount, dec!(200));
}

#[tokio::test]
async fn receipt_projection_reflects_the_workflow() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let (order_id, payment_id) = confirmed_order(&app, &store, &admin).await;

    app.state
        .services
        .payments
        .submit_transaction(
            order_id,
            store.id,
            SubmitTransactionRequest {
                transaction_id: "TXN123".to_string(),
            },
        )
        .await
        .unwrap();
    app.state
        .services
        .payments
        .verify(
            payment_id,
            admin.id,
            VerifyPaymentRequest {
                approve: true,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Not shipped yet: the receipt says so.
    let receipt = app
        .state
        .services
        .reports
        .receipt(payment_id, Actor::Store(store.id))
        .await
        .unwrap();
    assert!(receipt.receipt_number.starts_with("RCPT-"));
    assert_eq!(receipt.transaction_id.as_deref(), Some("TXN123"));
    assert_eq!(receipt.shipping_date, "not shipped");
    assert_eq!(receipt.total_amount, dec!(200));
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.items[0].quantity, 2);
    assert_eq!(receipt.items[0].line_total, dec!(200));
    assert_eq!(receipt.items[0].dimensions.as_deref(), Some("10x10x4 cm"));
    assert!(receipt.payment_date.is_some());
    assert!(receipt.verified_date.is_some());

    app.state
        .services
        .orders
        .update_shipping_status(order_id, ShippingStatus::Shipped, admin.id)
        .await
        .unwrap();

    let receipt = app
        .state
        .services
        .reports
        .receipt(payment_id, Actor::Store(store.id))
        .await
        .unwrap();
    assert_ne!(receipt.shipping_date, "not shipped");
}

#[tokio::test]
async fn receipts_of_other_tenants_are_forbidden() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let other = app.create_store(&admin).await;
    let (_, payment_id) = confirmed_order(&app, &store, &admin).await;

    let err = app
        .state
        .services
        .reports
        .receipt(payment_id, Actor::Store(other.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // Admins may print any receipt.
    let receipt = app
        .state
        .services
        .reports
        .receipt(payment_id, Actor::Admin(admin.id))
        .await
        .unwrap();
    assert_eq!(receipt.total_amount, dec!(200));
}
