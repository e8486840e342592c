use axum::{
    extract::{Json, State},
    response::Response,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{Principal, Role};
use crate::errors::ServiceError;
use crate::handlers::common::{success_response, validate_input};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/login", post(admin_login))
        .route("/store/login", post(store_login))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub role: Role,
    pub id: Uuid,
    pub name: String,
}

async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;

    let admin = state
        .auth
        .authenticate_admin(&request.email, &request.password)
        .await?;

    let principal = Principal {
        id: admin.id,
        role: Role::Admin,
        name: admin.name.clone(),
        email: admin.email,
    };
    let token = state.auth.generate_token(&principal)?;

    info!(admin_id = %admin.id, "admin logged in");
    Ok(success_response(
        "Login successful",
        TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: state.auth.token_ttl_secs(),
            role: Role::Admin,
            id: admin.id,
            name: admin.name,
        },
    ))
}

async fn store_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;

    let store = state
        .auth
        .authenticate_store(&request.email, &request.password)
        .await?;

    let principal = Principal {
        id: store.id,
        role: Role::Store,
        name: store.name.clone(),
        email: store.email,
    };
    let token = state.auth.generate_token(&principal)?;

    info!(store_id = %store.id, "store logged in");
    Ok(success_response(
        "Login successful",
        TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: state.auth.token_ttl_secs(),
            role: Role::Store,
            id: store.id,
            name: store.name,
        },
    ))
}
