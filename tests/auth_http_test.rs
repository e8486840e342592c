mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, STORE_PASSWORD};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn store_login_yields_a_working_token() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/store/login",
            None,
            Some(json!({ "email": store.email, "password": STORE_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["role"], json!("store"));
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(Method::GET, "/api/v1/cart", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["items"], json!([]));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/store/login",
            None,
            Some(json!({ "email": store.email, "password": "nope-nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn missing_and_garbage_tokens_are_unauthorized() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/v1/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::GET, "/api/v1/cart", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn role_gating_is_enforced_over_http() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let admin_token = app.token_for_admin(&admin);
    let store_token = app.token_for_store(&store);

    // A store cannot reach admin operations.
    let (status, _) = app
        .request(Method::GET, "/api/v1/orders", Some(&store_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/orders/{}/confirm", uuid::Uuid::new_v4()),
            Some(&store_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin cannot reach store-only operations.
    let (status, _) = app
        .request(Method::GET, "/api/v1/orders/my", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin listing works and carries the envelope.
    let (status, body) = app
        .request(Method::GET, "/api/v1/orders", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["total"], json!(0));
}

#[tokio::test]
async fn full_workflow_over_http() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let store = app.create_store(&admin).await;
    let product = app.create_product(store.id, dec!(100), 10).await;
    let address = app.create_address(store.id, true).await;
    let admin_token = app.token_for_admin(&admin);
    let store_token = app.token_for_store(&store);

    // Store fills the cart and places the order.
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(&store_token),
            Some(json!({ "product_id": product.id, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(&store_token),
            Some(json!({ "address_id": address.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let total: rust_decimal::Decimal = body["data"]["total_amount"]
        .as_str()
        .expect("total_amount should serialize as a string")
        .parse()
        .unwrap();
    assert_eq!(total, dec!(200));
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Admin confirms; payment is linked.
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/orders/{order_id}/confirm"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("confirmed"));
    let payment_id = body["data"]["payment_id"].as_str().unwrap().to_string();

    // A second confirmation answers 409.
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/orders/{order_id}/confirm"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Conflict"));

    // Store submits the transaction id; admin verifies.
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/payments/order/{order_id}/transaction"),
            Some(&store_token),
            Some(json!({ "transaction_id": "TXN123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("submitted"));

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/payments/{payment_id}/verify"),
            Some(&admin_token),
            Some(json!({ "approve": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("verified"));

    // Admin ships; store confirms receipt; order completes.
    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/orders/{order_id}/shipping-status"),
            Some(&admin_token),
            Some(json!({ "status": "shipped" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/orders/{order_id}/received"),
            Some(&store_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("completed"));
    assert_eq!(body["data"]["payment_status"], json!("completed"));

    // Receipt renders for the owner.
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/v1/payments/{payment_id}/receipt"),
            Some(&store_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transaction_id"], json!("TXN123"));
}
