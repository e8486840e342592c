use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::payments::{SubmitTransactionRequest, VerifyPaymentRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id/initiate", post(initiate_payment))
        .route("/order/:order_id/transaction", post(submit_transaction))
        .route("/:id/verify", post(verify_payment))
        .route("/:id", get(get_payment))
        .route("/:id/receipt", get(get_receipt))
}

async fn initiate_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::InitiatePayment)?;
    let payment = state.services.payments.initiate(order_id, user.id).await?;
    Ok(created_response("Payment initiated", payment))
}

async fn submit_transaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<SubmitTransactionRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::SubmitTransaction)?;
    let payment = state
        .services
        .payments
        .submit_transaction(order_id, user.store_id()?, request)
        .await?;
    Ok(success_response("Transaction submitted", payment))
}

async fn verify_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::VerifyPayment)?;
    let payment = state
        .services
        .payments
        .verify(payment_id, user.id, request)
        .await?;
    Ok(success_response("Payment verification recorded", payment))
}

async fn get_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ReadPayment)?;
    let payment = state
        .services
        .payments
        .get(payment_id, user.actor())
        .await?;
    Ok(success_response("Payment fetched", payment))
}

async fn get_receipt(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ReadReceipt)?;
    let receipt = state
        .services
        .reports
        .receipt(payment_id, user.actor())
        .await?;
    Ok(success_response("Receipt fetched", receipt))
}
