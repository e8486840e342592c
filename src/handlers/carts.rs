use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability};
use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::services::carts::{AddItemRequest, UpdateItemRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_cart))
        .route("/", delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/:product_id", put(update_item))
        .route("/items/:product_id", delete(remove_item))
}

async fn get_cart(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCart)?;
    let cart = state.services.carts.get_cart(user.store_id()?).await?;
    Ok(success_response("Cart fetched", cart))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<AddItemRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCart)?;
    let cart = state
        .services
        .carts
        .add_item(user.store_id()?, request)
        .await?;
    Ok(success_response("Item added to cart", cart))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCart)?;
    let cart = state
        .services
        .carts
        .update_item(user.store_id()?, product_id, request.quantity)
        .await?;
    Ok(success_response("Cart item updated", cart))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCart)?;
    let cart = state
        .services
        .carts
        .remove_item(user.store_id()?, product_id)
        .await?;
    Ok(success_response("Cart item removed", cart))
}

async fn clear_cart(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCart)?;
    let cart = state.services.carts.clear(user.store_id()?).await?;
    Ok(success_response("Cart cleared", cart))
}
