use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QuerySelect, RelationTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order::OrderStatus;
use crate::entities::payment::PaymentStatus;
use crate::entities::{
    order, order_item, payment, product, Order, OrderItem, Payment, Product, Store,
};
use crate::errors::ServiceError;
use crate::services::Actor;

/// Sentinel used on receipts for orders that have not shipped yet.
const NOT_SHIPPED: &str = "not shipped";

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptLine {
    pub product_name: String,
    pub quantity: i32,
    pub dimensions: Option<String>,
    pub price: Decimal,
    pub line_total: Decimal,
}

/// Printable receipt projection for a payment.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptResponse {
    pub receipt_number: String,
    pub order_number: String,
    pub transaction_id: Option<String>,
    pub order_date: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
    pub verified_date: Option<DateTime<Utc>>,
    /// RFC 3339 shipping date, or "not shipped".
    pub shipping_date: String,
    pub items: Vec<ReceiptLine>,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub confirmed_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    /// Sum of verified payment amounts in scope.
    pub total_revenue: Decimal,
    pub products: u64,
    /// Total store count; admin scope only.
    pub stores: Option<u64>,
}

/// Read-only aggregation over orders, payments and products for dashboards
/// and printable receipts. Never mutates anything.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Builds the printable receipt for a payment. Store callers may only
    /// fetch receipts for payments tied to their own orders.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn receipt(
        &self,
        payment_id: Uuid,
        actor: Actor,
    ) -> Result<ReceiptResponse, ServiceError> {
        let payment_row = Payment::find_by_id(payment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        let order = Order::find_by_id(payment_row.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "payment {} references missing order {}",
                    payment_id, payment_row.order_id
                ))
            })?;

        if let Some(store_id) = actor.store_scope() {
            if order.store_id != store_id {
                return Err(ServiceError::Forbidden(
                    "receipts are limited to your own orders".to_string(),
                ));
            }
        }

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let dimensions: HashMap<Uuid, Option<String>> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            Product::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|p| (p.id, p.dimensions))
                .collect()
        };

        let lines = items
            .into_iter()
            .map(|item| ReceiptLine {
                dimensions: dimensions.get(&item.product_id).cloned().flatten(),
                line_total: item.line_total(),
                product_name: item.product_name,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        Ok(ReceiptResponse {
            receipt_number: receipt_number(payment_id),
            order_number: order.order_number,
            transaction_id: payment_row.transaction_id,
            order_date: order.created_at,
            payment_date: payment_row.paid_at,
            verified_date: payment_row.verified_at,
            shipping_date: order
                .shipped_at
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| NOT_SHIPPED.to_string()),
            items: lines,
            total_amount: payment_row.amount,
        })
    }

    /// Aggregates order, revenue and catalog counts. Store callers see
    /// their own tenant; admins see everything plus the store count.
    #[instrument(skip(self))]
    pub async fn dashboard(&self, actor: Actor) -> Result<DashboardResponse, ServiceError> {
        let scope = actor.store_scope();

        let count_orders = |status: Option<OrderStatus>| {
            let mut query = Order::find();
            if let Some(store_id) = scope {
                query = query.filter(order::Column::StoreId.eq(store_id));
            }
            if let Some(status) = status {
                query = query.filter(order::Column::Status.eq(status));
            }
            query.count(&*self.db)
        };

        let total_orders = count_orders(None).await?;
        let pending_orders = count_orders(Some(OrderStatus::Pending)).await?;
        let confirmed_orders = count_orders(Some(OrderStatus::Confirmed)).await?;
        let completed_orders = count_orders(Some(OrderStatus::Completed)).await?;
        let cancelled_orders = count_orders(Some(OrderStatus::Cancelled)).await?;

        let mut revenue_query =
            Payment::find().filter(payment::Column::Status.eq(PaymentStatus::Verified));
        if let Some(store_id) = scope {
            revenue_query = revenue_query
                .join(JoinType::InnerJoin, payment::Relation::Order.def())
                .filter(order::Column::StoreId.eq(store_id));
        }
        let total_revenue: Decimal = revenue_query
            .all(&*self.db)
            .await?
            .iter()
            .map(|p| p.amount)
            .sum();

        let mut product_query = Product::find();
        if let Some(store_id) = scope {
            product_query = product_query.filter(product::Column::StoreId.eq(store_id));
        }
        let products = product_query.count(&*self.db).await?;

        let stores = match scope {
            None => Some(Store::find().count(&*self.db).await?),
            Some(_) => None,
        };

        Ok(DashboardResponse {
            total_orders,
            pending_orders,
            confirmed_orders,
            completed_orders,
            cancelled_orders,
            total_revenue,
            products,
            stores,
        })
    }
}

/// Receipt numbers derive from the payment id, so reprinting a receipt
/// always yields the same number.
fn receipt_number(payment_id: Uuid) -> String {
    let simple = payment_id.simple().to_string();
    format!("RCPT-{}", simple[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_number_is_stable_and_prefixed() {
        let id = Uuid::new_v4();
        let a = receipt_number(id);
        let b = receipt_number(id);
        assert_eq!(a, b);
        assert!(a.starts_with("RCPT-"));
        assert_eq!(a.len(), 13);
    }
}
