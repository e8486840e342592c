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
use crate::handlers::common::{created_response, success_response};
use crate::services::companies::{CreateCompanyRequest, UpdateCompanyRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_company))
        .route("/", get(list_companies))
        .route("/:id", get(get_company))
        .route("/:id", put(update_company))
        .route("/:id", delete(delete_company))
        .route("/:id/stores", get(list_company_stores))
}

async fn create_company(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateCompanyRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCompanies)?;
    let company = state.services.companies.create(request, user.id).await?;
    Ok(created_response("Company created", company))
}

async fn list_companies(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCompanies)?;
    let companies = state.services.companies.list().await?;
    Ok(success_response("Companies fetched", companies))
}

async fn get_company(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(company_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCompanies)?;
    let company = state.services.companies.get(company_id).await?;
    Ok(success_response("Company fetched", company))
}

async fn update_company(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(company_id): Path<Uuid>,
    Json(request): Json<UpdateCompanyRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCompanies)?;
    let company = state
        .services
        .companies
        .update(company_id, request)
        .await?;
    Ok(success_response("Company updated", company))
}

async fn delete_company(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(company_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCompanies)?;
    state.services.companies.delete(company_id).await?;
    Ok(success_response("Company deleted", serde_json::json!({})))
}

async fn list_company_stores(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(company_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageCompanies)?;
    let stores = state.services.stores.list_by_company(company_id).await?;
    Ok(success_response("Stores fetched", stores))
}
