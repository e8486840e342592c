use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability, Role};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::products::{CreateProductRequest, UpdateProductRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_product))
        .route("/mine", get(list_my_products))
        .route("/store/:store_id", get(list_store_products))
        .route("/:id", get(get_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageProducts)?;
    let product = state.services.products.create(request).await?;
    Ok(created_response("Product created", product))
}

async fn list_my_products(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ReadOwnProducts)?;
    let products = state
        .services
        .products
        .list_by_store(user.store_id()?)
        .await?;
    Ok(success_response("Products fetched", products))
}

async fn list_store_products(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageProducts)?;
    let products = state.services.products.list_by_store(store_id).await?;
    Ok(success_response("Products fetched", products))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let product = match user.role {
        Role::Admin => {
            user.authorize(Capability::ManageProducts)?;
            state.services.products.get(product_id).await?
        }
        Role::Store => {
            user.authorize(Capability::ReadOwnProducts)?;
            state
                .services
                .products
                .get_owned(product_id, user.store_id()?)
                .await?
        }
    };
    Ok(success_response("Product fetched", product))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageProducts)?;
    let product = state.services.products.update(product_id, request).await?;
    Ok(success_response("Product updated", product))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    user.authorize(Capability::ManageProducts)?;
    state.services.products.delete(product_id).await?;
    Ok(success_response("Product deleted", serde_json::json!({})))
}
