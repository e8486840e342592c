use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::addresses::{CreateAddressRequest, UpdateAddressRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_addresses))
        .route("/", post(create_address))
        .route("/:id", put(update_address))
        .route("/:id", delete(delete_address))
        .route("/:id/default", patch(set_default_address))
}

async fn list_addresses(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageAddresses)?;
    let addresses = state.services.addresses.list(user.store_id()?).await?;
    Ok(success_response("Addresses fetched", addresses))
}

async fn create_address(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateAddressRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageAddresses)?;
    let address = state
        .services
        .addresses
        .create(user.store_id()?, request)
        .await?;
    Ok(created_response("Address created", address))
}

async fn update_address(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(address_id): Path<Uuid>,
    Json(request): Json<UpdateAddressRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageAddresses)?;
    let address = state
        .services
        .addresses
        .update(address_id, user.store_id()?, request)
        .await?;
    Ok(success_response("Address updated", address))
}

async fn delete_address(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(address_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageAddresses)?;
    state
        .services
        .addresses
        .delete(address_id, user.store_id()?)
        .await?;
    Ok(success_response("Address deleted", serde_json::json!({})))
}

async fn set_default_address(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(address_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageAddresses)?;
    let address = state
        .services
        .addresses
        .set_default(address_id, user.store_id()?)
        .await?;
    Ok(success_response("Default address updated", address))
}
