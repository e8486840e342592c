use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability};
use crate::entities::order::OrderStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::orders::{
    CancelOrderRequest, CreateOrderRequest, UpdatePaymentStatusRequest,
    UpdateShippingStatusRequest,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_order))
        .route("/", get(list_all_orders))
        .route("/my", get(list_my_orders))
        .route("/:id", get(get_order))
        .route("/:id/confirm", patch(confirm_order))
        .route("/:id/cancel", patch(cancel_order))
        .route("/:id/shipping-status", patch(update_shipping_status))
        .route("/:id/payment-status", patch(update_payment_status))
        .route("/:id/received", patch(confirm_received))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::PlaceOrder)?;
    let order = state
        .services
        .orders
        .create_from_cart(user.store_id()?, request)
        .await?;
    Ok(created_response("Order created", order))
}

async fn list_all_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ListAllOrders)?;
    let orders = state
        .services
        .orders
        .list_all(query.status, query.page, query.per_page)
        .await?;
    Ok(success_response("Orders fetched", orders))
}

async fn list_my_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ListOwnOrders)?;
    let orders = state
        .services
        .orders
        .list_by_store(user.store_id()?, query.status, query.page, query.per_page)
        .await?;
    Ok(success_response("Orders fetched", orders))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ReadOrder)?;
    let order = state.services.orders.get(order_id, user.actor()).await?;
    Ok(success_response("Order fetched", order))
}

async fn confirm_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ConfirmOrder)?;
    let order = state.services.orders.confirm(order_id, user.id).await?;
    Ok(success_response("Order confirmed", order))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::CancelOrder)?;
    let order = state
        .services
        .orders
        .cancel(order_id, user.id, request)
        .await?;
    Ok(success_response("Order cancelled", order))
}

async fn update_shipping_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateShippingStatusRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::UpdateShippingStatus)?;
    let order = state
        .services
        .orders
        .update_shipping_status(order_id, request.status, user.id)
        .await?;
    Ok(success_response("Shipping status updated", order))
}

async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::UpdateOrderPaymentStatus)?;
    let order = state
        .services
        .orders
        .update_payment_status(order_id, request.status, user.id)
        .await?;
    Ok(success_response("Payment status updated", order))
}

async fn confirm_received(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ConfirmOrderReceived)?;
    let order = state
        .services
        .orders
        .confirm_received(order_id, user.store_id()?)
        .await?;
    Ok(success_response("Order receipt confirmed", order))
}
