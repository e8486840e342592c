use axum::{extract::State, response::Response, routing::get, Router};
use std::sync::Arc;

use crate::auth::{AuthUser, Capability};
use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(dashboard))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ReadDashboard)?;
    let stats = state.services.reports.dashboard(user.actor()).await?;
    Ok(success_response("Dashboard fetched", stats))
}
