use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{product, Product, Store};
use crate::errors::ServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    pub store_id: Uuid,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub price: Decimal,
    pub brand: Option<String>,
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    #[serde(default)]
    pub qty: i32,
    pub image: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub dimensions: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub brand: Option<String>,
    pub qty: Option<i32>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub dimensions: Option<String>,
}

/// Catalog administration. Products belong to exactly one store and are
/// written by admins only; order placement never touches `qty`.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(store_id = %request.store_id))]
    pub async fn create(&self, request: CreateProductRequest) -> Result<product::Model, ServiceError> {
        request.validate()?;
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".to_string(),
            ));
        }

        Store::find_by_id(request.store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Store {} not found", request.store_id))
            })?;

        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(request.store_id),
            name: Set(request.name),
            price: Set(request.price),
            brand: Set(request.brand),
            qty: Set(request.qty),
            image: Set(request.image),
            description: Set(request.description),
            category: Set(request.category),
            dimensions: Set(request.dimensions),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %created.id, "product created");
        Ok(created)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn list_by_store(&self, store_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        Ok(Product::find()
            .filter(product::Column::StoreId.eq(store_id))
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        if matches!(request.price, Some(p) if p < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".to_string(),
            ));
        }
        if matches!(request.qty, Some(q) if q < 0) {
            return Err(ServiceError::ValidationError(
                "stock quantity cannot be negative".to_string(),
            ));
        }

        let existing = self.get(product_id).await?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(brand) = request.brand {
            active.brand = Set(Some(brand));
        }
        if let Some(qty) = request.qty {
            active.qty = Set(qty);
        }
        if let Some(image) = request.image {
            active.image = Set(Some(image));
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(category) = request.category {
            active.category = Set(Some(category));
        }
        if let Some(dimensions) = request.dimensions {
            active.dimensions = Set(Some(dimensions));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(product_id).await?;
        Product::delete_by_id(existing.id).exec(&*self.db).await?;
        info!(%product_id, "product deleted");
        Ok(())
    }

    /// Store-facing read used to require ownership: a product of another
    /// tenant reads as absent.
    #[instrument(skip(self), fields(product_id = %product_id, store_id = %store_id))]
    pub async fn get_owned(
        &self,
        product_id: Uuid,
        store_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.store_id == store_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }
}
