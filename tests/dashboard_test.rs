mod common;

use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use storefront_api::entities::{payment, Payment};
use storefront_api::services::carts::AddItemRequest;
use storefront_api::services::orders::CreateOrderRequest;
use storefront_api::services::payments::{SubmitTransactionRequest, VerifyPaymentRequest};
use storefront_api::services::Actor;

#[tokio::test]
async fn dashboard_aggregates_per_scope() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let other = app.create_store(&admin).await;

    // Store one: a verified $200 order.
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
    app.state
        .services
        .orders
        .confirm(order.id, admin.id)
        .await
        .unwrap();
    app.state
        .services
        .payments
        .submit_transaction(
            order.id,
            store.id,
            SubmitTransactionRequest {
                transaction_id: "TXN-DASH".to_string(),
            },
        )
        .await
        .unwrap();
    let payment_row = Payment::find()
        .filter(payment::Column::OrderId.eq(order.id))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    app.state
        .services
        .payments
        .verify(
            payment_row.id,
            admin.id,
            VerifyPaymentRequest {
                approve: true,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Store two: a pending order for $5.
    let other_product = app.create_product(other.id, dec!(5), 10).await;
    app.state
        .services
        .carts
        .add_item(
            other.id,
            AddItemRequest {
                product_id: other_product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();
    let other_address = app.create_address(other.id, true).await;
    app.state
        .services
        .orders
        .create_from_cart(
            other.id,
            CreateOrderRequest {
                address_id: other_address.id,
            },
        )
        .await
        .unwrap();

    // Admin sees everything.
    let global = app
        .state
        .services
        .reports
        .dashboard(Actor::Admin(admin.id))
        .await
        .unwrap();
    assert_eq!(global.total_orders, 2);
    assert_eq!(global.confirmed_orders, 1);
    assert_eq!(global.pending_orders, 1);
    assert_eq!(global.total_revenue, dec!(200));
    assert_eq!(global.products, 2);
    assert_eq!(global.stores, Some(2));

    // Each store only sees its own tenant.
    let mine = app
        .state
        .services
        .reports
        .dashboard(Actor::Store(store.id))
        .await
        .unwrap();
    assert_eq!(mine.total_orders, 1);
    assert_eq!(mine.total_revenue, dec!(200));
    assert_eq!(mine.products, 1);
    assert_eq!(mine.stores, None);

    let theirs = app
        .state
        .services
        .reports
        .dashboard(Actor::Store(other.id))
        .await
        .unwrap();
    assert_eq!(theirs.total_orders, 1);
    assert_eq!(theirs.total_revenue, Decimal::ZERO);
    assert_eq!(theirs.pending_orders, 1);
}
