use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{company, Company};
use crate::errors::{is_unique_violation, ServiceError};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, message = "Company name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Company administration. Names are unique; a duplicate reads as Conflict.
#[derive(Clone)]
pub struct CompanyService {
    db: Arc<DatabaseConnection>,
}

impl CompanyService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateCompanyRequest,
        admin_id: Uuid,
    ) -> Result<company::Model, ServiceError> {
        request.validate()?;

        let now = Utc::now();
        let created = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            created_by: Set(admin_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("a company with this name already exists".to_string())
            } else {
                e.into()
            }
        })?;

        info!(company_id = %created.id, "company created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<company::Model>, ServiceError> {
        Ok(Company::find()
            .order_by_asc(company::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn get(&self, company_id: Uuid) -> Result<company::Model, ServiceError> {
        Company::find_by_id(company_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", company_id)))
    }

    #[instrument(skip(self, request), fields(company_id = %company_id))]
    pub async fn update(
        &self,
        company_id: Uuid,
        request: UpdateCompanyRequest,
    ) -> Result<company::Model, ServiceError> {
        let existing = self.get(company_id).await?;

        let mut active: company::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now());

        active.update(&*self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("a company with this name already exists".to_string())
            } else {
                e.into()
            }
        })
    }

    /// Deletes a company. Stores referencing it are left in place; cascaded
    /// cleanup is an operator task.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn delete(&self, company_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(company_id).await?;
        Company::delete_by_id(existing.id).exec(&*self.db).await?;
        warn!(%company_id, "company deleted");
        Ok(())
    }
}
