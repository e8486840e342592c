use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::hash_password;
use crate::entities::{store, Company, Store};
use crate::errors::{is_unique_violation, ServiceError};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStoreRequest {
    pub company_id: Uuid,
    #[validate(length(min = 1, message = "Store name is required"))]
    pub name: String,
    pub location: Option<String>,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub landing_page: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub landing_page: Option<serde_json::Value>,
}

/// Tenant administration. Stores are created by admins; each store doubles
/// as an authenticatable principal, so creation hashes the password.
#[derive(Clone)]
pub struct StoreService {
    db: Arc<DatabaseConnection>,
}

impl StoreService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(company_id = %request.company_id, email = %request.email))]
    pub async fn create(
        &self,
        request: CreateStoreRequest,
        admin_id: Uuid,
    ) -> Result<store::Model, ServiceError> {
        request.validate()?;

        Company::find_by_id(request.company_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Company {} not found", request.company_id))
            })?;

        let password_hash = hash_password(&request.password)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        let now = Utc::now();
        let created = store::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(request.company_id),
            name: Set(request.name),
            location: Set(request.location),
            email: Set(request.email.to_lowercase()),
            password_hash: Set(password_hash),
            address: Set(request.address),
            phone: Set(request.phone),
            image: Set(request.image),
            landing_page: Set(request.landing_page),
            created_by: Set(admin_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("a store with this email already exists".to_string())
            } else {
                e.into()
            }
        })?;

        info!(store_id = %created.id, "store created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<store::Model>, ServiceError> {
        Ok(Store::find()
            .order_by_asc(store::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn get(&self, store_id: Uuid) -> Result<store::Model, ServiceError> {
        Store::find_by_id(store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", store_id)))
    }

    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<store::Model>, ServiceError> {
        Ok(Store::find()
            .filter(store::Column::CompanyId.eq(company_id))
            .order_by_asc(store::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(store_id = %store_id))]
    pub async fn update(
        &self,
        store_id: Uuid,
        request: UpdateStoreRequest,
    ) -> Result<store::Model, ServiceError> {
        let existing = self.get(store_id).await?;

        let mut active: store::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(location) = request.location {
            active.location = Set(Some(location));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(image) = request.image {
            active.image = Set(Some(image));
        }
        if let Some(landing_page) = request.landing_page {
            active.landing_page = Set(Some(landing_page));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }
}
