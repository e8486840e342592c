mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::errors::ServiceError;
use storefront_api::services::carts::AddItemRequest;
use storefront_api::services::products::UpdateProductRequest;
use uuid::Uuid;

#[tokio::test]
async fn add_item_snapshots_price_and_totals() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let product = app.create_product(store.id, dec!(100), 10).await;

    let cart = app
        .state
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
        .expect("add_item failed");

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.items[0].price, dec!(100));
    assert_eq!(cart.total, dec!(200));

    // A later catalog price change must not alter the snapshot total.
    app.state
        .services
        .products
        .update(
            product.id,
            UpdateProductRequest {
                price: Some(dec!(150)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let cart = app.state.services.carts.get_cart(store.id).await.unwrap();
    assert_eq!(cart.items[0].price, dec!(100));
    assert_eq!(cart.total, dec!(200));
}

#[tokio::test]
async fn adding_same_product_increments_quantity() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let product = app.create_product(store.id, dec!(19.99), 10).await;

    for _ in 0..2 {
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
    }

    let cart = app.state.services.carts.get_cart(store.id).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.total, dec!(39.98));
}

#[tokio::test]
async fn carting_foreign_product_is_forbidden() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let other_store = app.create_store(&admin).await;
    let foreign_product = app.create_product(other_store.id, dec!(5), 10).await;

    let err = app
        .state
        .services
        .carts
        .add_item(
            store.id,
            AddItemRequest {
                product_id: foreign_product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Forbidden(_));

    let cart = app.state.services.carts.get_cart(store.id).await.unwrap();
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn carting_unknown_product_is_not_found() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;

    let err = app
        .state
        .services
        .carts
        .add_item(
            store.id,
            AddItemRequest {
                product_id: Uuid::new_v4(),
                quantity: 1,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn missing_cart_reads_as_empty() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;

    let cart = app.state.services.carts.get_cart(store.id).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);
}

#[tokio::test]
async fn update_item_overwrites_quantity_and_zero_removes() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let product = app.create_product(store.id, dec!(10), 10).await;

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

    let cart = app
        .state
        .services
        .carts
        .update_item(store.id, product.id, 5)
        .await
        .unwrap();
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.total, dec!(50));

    let cart = app
        .state
        .services
        .carts
        .update_item(store.id, product.id, 0)
        .await
        .unwrap();
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn updating_absent_line_is_not_found() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let product = app.create_product(store.id, dec!(10), 10).await;

    // No cart yet at all.
    let err = app
        .state
        .services
        .carts
        .update_item(store.id, product.id, 3)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    // Cart exists, line does not.
    let other = app.create_product(store.id, dec!(1), 10).await;
    app.state
        .services
        .carts
        .add_item(
            store.id,
            AddItemRequest {
                product_id: other.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .carts
        .update_item(store.id, product.id, 3)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn remove_item_is_idempotent() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let product = app.create_product(store.id, dec!(10), 10).await;

    // Removing from a store with no cart is a no-op.
    let cart = app
        .state
        .services
        .carts
        .remove_item(store.id, product.id)
        .await
        .unwrap();
    assert!(cart.items.is_empty());

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

    let cart = app
        .state
        .services
        .carts
        .remove_item(store.id, product.id)
        .await
        .unwrap();
    assert!(cart.items.is_empty());

    // Removing again is still fine.
    let cart = app
        .state
        .services
        .carts
        .remove_item(store.id, product.id)
        .await
        .unwrap();
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn clear_empties_the_cart() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let a = app.create_product(store.id, dec!(10), 10).await;
    let b = app.create_product(store.id, dec!(20), 10).await;

    for product_id in [a.id, b.id] {
        app.state
            .services
            .carts
            .add_item(
                store.id,
                AddItemRequest {
                    product_id,
                    quantity: 1,
                },
            )
            .await
            .unwrap();
    }

    let cart = app.state.services.carts.clear(store.id).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);
}

#[tokio::test]
async fn admin_calls_to_cart_endpoints_are_rejected() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let product = app.create_product(store.id, dec!(10), 10).await;
    let admin_token = app.token_for_admin(&admin);

    let (status, body) = app
        .request(Method::GET, "/api/v1/cart", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(&admin_token),
            Some(json!({ "product_id": product.id, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
