use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{address, Address};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address line is required"))]
    pub address_line1: String,
    pub address_line2: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Zip code is required"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAddressRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// Store address book. Keeps the invariant that at most one address per
/// store is the default: every write that sets a default unsets the
/// siblings in the same transaction, so concurrent set-default calls
/// resolve to last-write-wins with the invariant intact.
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(store_id = %store_id))]
    pub async fn create(
        &self,
        store_id: Uuid,
        request: CreateAddressRequest,
    ) -> Result<address::Model, ServiceError> {
        request.validate()?;

        let txn = self.db.begin().await?;

        if request.is_default {
            Address::update_many()
                .col_expr(address::Column::IsDefault, Expr::value(false))
                .filter(address::Column::StoreId.eq(store_id))
                .exec(&txn)
                .await?;
        }

        let now = Utc::now();
        let created = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            full_name: Set(request.full_name),
            phone: Set(request.phone),
            address_line1: Set(request.address_line1),
            address_line2: Set(request.address_line2),
            city: Set(request.city),
            state: Set(request.state),
            zip_code: Set(request.zip_code),
            country: Set(request.country),
            is_default: Set(request.is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(address_id = %created.id, "address created");
        Ok(created)
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn list(&self, store_id: Uuid) -> Result<Vec<address::Model>, ServiceError> {
        Ok(Address::find()
            .filter(address::Column::StoreId.eq(store_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(address_id = %address_id, store_id = %store_id))]
    pub async fn update(
        &self,
        address_id: Uuid,
        store_id: Uuid,
        request: UpdateAddressRequest,
    ) -> Result<address::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = Address::find_by_id(address_id)
            .one(&txn)
            .await?
            .filter(|a| a.store_id == store_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))?;

        let mut active: address::ActiveModel = existing.into();
        if let Some(full_name) = request.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone);
        }
        if let Some(line1) = request.address_line1 {
            active.address_line1 = Set(line1);
        }
        if let Some(line2) = request.address_line2 {
            active.address_line2 = Set(Some(line2));
        }
        if let Some(city) = request.city {
            active.city = Set(city);
        }
        if let Some(state) = request.state {
            active.state = Set(state);
        }
        if let Some(zip_code) = request.zip_code {
            active.zip_code = Set(zip_code);
        }
        if let Some(country) = request.country {
            active.country = Set(country);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self), fields(address_id = %address_id, store_id = %store_id))]
    pub async fn delete(&self, address_id: Uuid, store_id: Uuid) -> Result<(), ServiceError> {
        let existing = Address::find_by_id(address_id)
            .one(&*self.db)
            .await?
            .filter(|a| a.store_id == store_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))?;

        Address::delete_by_id(existing.id).exec(&*self.db).await?;
        Ok(())
    }

    /// Makes one address the default, unsetting every sibling in the same
    /// transaction.
    #[instrument(skip(self), fields(address_id = %address_id, store_id = %store_id))]
    pub async fn set_default(
        &self,
        address_id: Uuid,
        store_id: Uuid,
    ) -> Result<address::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let target = Address::find_by_id(address_id)
            .one(&txn)
            .await?
            .filter(|a| a.store_id == store_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))?;

        Address::update_many()
            .col_expr(address::Column::IsDefault, Expr::value(false))
            .filter(address::Column::StoreId.eq(store_id))
            .filter(address::Column::Id.ne(address_id))
            .exec(&txn)
            .await?;

        let mut active: address::ActiveModel = target.into();
        active.is_default = Set(true);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::DefaultAddressChanged {
                store_id,
                address_id,
            })
            .await;

        info!(%address_id, "default address changed");
        Ok(updated)
    }
}
