use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::stores::{CreateStoreRequest, UpdateStoreRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_store))
        .route("/", get(list_stores))
        .route("/profile", get(get_own_profile))
        .route("/:id", get(get_store))
        .route("/:id", put(update_store))
}

async fn create_store(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateStoreRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageStores)?;
    let store = state.services.stores.create(request, user.id).await?;
    Ok(created_response("Store created", store))
}

async fn list_stores(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageStores)?;
    let stores = state.services.stores.list().await?;
    Ok(success_response("Stores fetched", stores))
}

async fn get_own_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ReadOwnStoreProfile)?;
    let store = state.services.stores.get(user.store_id()?).await?;
    Ok(success_response("Store profile fetched", store))
}

async fn get_store(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageStores)?;
    let store = state.services.stores.get(store_id).await?;
    Ok(success_response("Store fetched", store))
}

async fn update_store(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
    Json(request): Json<UpdateStoreRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageStores)?;
    let store = state.services.stores.update(store_id, request).await?;
    Ok(success_response("Store updated", store))
}
