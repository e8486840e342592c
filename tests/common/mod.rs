#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::{
    auth::{hash_password, AuthConfig, AuthService, Principal, Role},
    config::AppConfig,
    db::{establish_connection_with_config, setup_schema, DbConfig},
    entities::{company, product, store, user},
    events::{process_events, EventSender},
    handlers,
    services::AppServices,
    AppState,
};

pub const ADMIN_PASSWORD: &str = "admin-pass-123";
pub const STORE_PASSWORD: &str = "store-pass-123";

/// Test harness backed by an in-memory SQLite database.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    /// Constructs a fresh application state with its own database.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );

        // A single pooled connection keeps the in-memory database alive for
        // the whole test.
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
        };
        let db = establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        setup_schema(&db).await.expect("failed to set up schema");

        let db = Arc::new(db);
        let cfg = Arc::new(cfg);

        let (event_tx, event_rx) = mpsc::channel(1024);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(process_events(event_rx));

        let auth = Arc::new(AuthService::new(
            AuthConfig::new(cfg.jwt_secret.clone(), cfg.jwt_expiration),
            db.clone(),
        ));
        let services = AppServices::new(db.clone(), event_sender.clone(), cfg.clone());

        let state = Arc::new(AppState {
            db,
            config: cfg,
            auth,
            event_sender,
            services,
        });

        let router = Router::new()
            .nest("/api/v1", handlers::api_router())
            .with_state(state.clone());

        Self { state, router }
    }

    /// Inserts an admin user with a known password.
    pub async fn create_admin(&self) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Test Admin".to_string()),
            email: Set(format!("admin-{}@example.com", Uuid::new_v4().simple())),
            password_hash: Set(hash_password(ADMIN_PASSWORD).unwrap()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create admin")
    }

    /// Inserts a company owned by the given admin.
    pub async fn create_company(&self, admin: &user::Model) -> company::Model {
        let now = Utc::now();
        company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(format!("Company {}", Uuid::new_v4().simple())),
            description: Set(Some("Test company".to_string())),
            created_by: Set(admin.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create company")
    }

    /// Inserts a store under a fresh company, with a known password.
    pub async fn create_store(&self, admin: &user::Model) -> store::Model {
        let company = self.create_company(admin).await;
        let now = Utc::now();
        store::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company.id),
            name: Set("Test Store".to_string()),
            location: Set(Some("Downtown".to_string())),
            email: Set(format!("store-{}@example.com", Uuid::new_v4().simple())),
            password_hash: Set(hash_password(STORE_PASSWORD).unwrap()),
            address: Set(None),
            phone: Set(None),
            image: Set(None),
            landing_page: Set(None),
            created_by: Set(admin.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create store")
    }

    /// Inserts a product owned by the given store.
    pub async fn create_product(
        &self,
        store_id: Uuid,
        price: Decimal,
        qty: i32,
    ) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            name: Set(format!("Widget {}", Uuid::new_v4().simple())),
            price: Set(price),
            brand: Set(Some("Acme".to_string())),
            qty: Set(qty),
            image: Set(None),
            description: Set(Some("A test widget".to_string())),
            category: Set(Some("widgets".to_string())),
            dimensions: Set(Some("10x10x4 cm".to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create product")
    }

    /// Creates an address through the address service.
    pub async fn create_address(
        &self,
        store_id: Uuid,
        is_default: bool,
    ) -> storefront_api::entities::address::Model {
        self.state
            .services
            .addresses
            .create(
                store_id,
                storefront_api::services::addresses::CreateAddressRequest {
                    full_name: "Pat Receiver".to_string(),
                    phone: "555-0100".to_string(),
                    address_line1: "1 Main St".to_string(),
                    address_line2: None,
                    city: "Springfield".to_string(),
                    state: "IL".to_string(),
                    zip_code: "62701".to_string(),
                    country: "US".to_string(),
                    is_default,
                },
            )
            .await
            .expect("failed to create address")
    }

    pub fn token_for_admin(&self, admin: &user::Model) -> String {
        self.state
            .auth
            .generate_token(&Principal {
                id: admin.id,
                role: Role::Admin,
                name: admin.name.clone(),
                email: admin.email.clone(),
            })
            .unwrap()
    }

    pub fn token_for_store(&self, store: &store::Model) -> String {
        self.state
            .auth
            .generate_token(&Principal {
                id: store.id,
                role: Role::Store,
                name: store.name.clone(),
                email: store.email.clone(),
            })
            .unwrap()
    }

    /// Drives one request through the router and decodes the JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
