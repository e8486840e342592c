pub mod addresses;
pub mod auth;
pub mod carts;
pub mod common;
pub mod companies;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reports;
pub mod stores;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Full v1 API surface, nested under `/api/v1` by the binary.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/cart", carts::routes())
        .nest("/orders", orders::routes())
        .nest("/payments", payments::routes())
        .nest("/addresses", addresses::routes())
        .nest("/products", products::routes())
        .nest("/stores", stores::routes())
        .nest("/companies", companies::routes())
        .nest("/reports", reports::routes())
}
