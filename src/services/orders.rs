use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::order::{OrderPaymentStatus, OrderStatus, ShippingAddress, ShippingStatus};
use crate::entities::{
    cart, cart_item, order, order_item, payment, product, Address, Cart, CartItem, Order,
    OrderItem, Payment, Product,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::carts::items_total;
use crate::services::payments::create_payment_for_order;
use crate::services::Actor;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Address the order ships to; must belong to the calling store.
    pub address_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShippingStatusRequest {
    pub status: ShippingStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub status: OrderPaymentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemView {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub store_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub shipping_status: ShippingStatus,
    pub total_amount: Decimal,
    pub shipping_address: ShippingAddress,
    pub payment_id: Option<Uuid>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub order_received_confirmation: bool,
    pub order_received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn generate_order_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("ORD-{}", suffix.to_uppercase())
}

/// Drives orders through pending -> confirmed -> (cancelled | completed).
///
/// Confirmation, cancellation and shipping updates are admin operations;
/// order creation and receipt confirmation belong to the owning store. All
/// state-machine preconditions are checked inside the mutating transaction,
/// so a violation performs no partial write.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    config: Arc<AppConfig>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, config: Arc<AppConfig>) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Creates an order from the store's cart and clears the cart in the
    /// same transaction.
    ///
    /// Totals come from the cart's snapshot prices, never the live catalog.
    /// The chosen address is copied into the order verbatim, so later edits
    /// to the address book do not touch placed orders. Stock quantities are
    /// not decremented here.
    #[instrument(skip(self, request), fields(store_id = %store_id, address_id = %request.address_id))]
    pub async fn create_from_cart(
        &self,
        store_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = Cart::find()
            .filter(cart::Column::StoreId.eq(store_id))
            .one(&txn)
            .await?;

        let items = match &cart {
            Some(cart) => {
                CartItem::find()
                    .filter(cart_item::Column::CartId.eq(cart.id))
                    .all(&txn)
                    .await?
            }
            None => Vec::new(),
        };

        if items.is_empty() {
            return Err(ServiceError::BadRequest(
                "cannot create an order from an empty cart".to_string(),
            ));
        }

        let address = Address::find_by_id(request.address_id)
            .one(&txn)
            .await?
            .filter(|a| a.store_id == store_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Address {} not found", request.address_id))
            })?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let product_names: HashMap<Uuid, String> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let total_amount = items_total(&items);
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            store_id: Set(store_id),
            total_amount: Set(total_amount),
            shipping_address: Set(ShippingAddress {
                full_name: address.full_name,
                phone: address.phone,
                address_line1: address.address_line1,
                address_line2: address.address_line2,
                city: address.city,
                state: address.state,
                zip_code: address.zip_code,
                country: address.country,
            }),
            status: Set(OrderStatus::Pending),
            payment_status: Set(OrderPaymentStatus::Pending),
            shipping_status: Set(ShippingStatus::Pending),
            payment_id: Set(None),
            confirmed_by: Set(None),
            confirmed_at: Set(None),
            cancelled_by: Set(None),
            cancelled_at: Set(None),
            cancellation_reason: Set(None),
            shipped_at: Set(None),
            delivered_at: Set(None),
            order_received_confirmation: Set(false),
            order_received_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut order_items = Vec::with_capacity(items.len());
        for item in &items {
            let line = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                product_name: Set(product_names
                    .get(&item.product_id)
                    .cloned()
                    .unwrap_or_else(|| format!("Product {}", item.product_id))),
                quantity: Set(item.quantity),
                price: Set(item.price),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            order_items.push(line);
        }

        // Checkout empties the cart atomically with order creation.
        if let Some(cart) = &cart {
            CartItem::delete_many()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        self.event_sender.send_or_log(Event::OrderCreated(order_id)).await;
        self.event_sender
            .send_or_log(Event::CartCleared { store_id })
            .await;

        info!(%order_id, %store_id, %total_amount, "order created from cart");
        Ok(model_to_response(order_model, order_items))
    }

    /// Confirms a pending order and issues its payment.
    ///
    /// Creates exactly one payment row (amount = order total, method
    /// "qr_code") and links it through `payment_id`. Not idempotent: a
    /// second confirmation, or one racing the first, fails with Conflict;
    /// the unique index on `payments.order_id` backstops the pre-check.
    #[instrument(skip(self), fields(order_id = %order_id, admin_id = %admin_id))]
    pub async fn confirm(&self, order_id: Uuid, admin_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status != OrderStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "order cannot be confirmed from status {}",
                order.status
            )));
        }

        if Payment::find()
            .filter(payment::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "a payment already exists for order {}",
                order_id
            )));
        }

        let payment_row = create_payment_for_order(
            &txn,
            order_id,
            order.total_amount,
            &self.config.payment_qr_code_url,
        )
        .await?;

        let now = Utc::now();
        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Confirmed);
        active.confirmed_by = Set(Some(admin_id));
        active.confirmed_at = Set(Some(now));
        active.payment_id = Set(Some(payment_row.id));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let items = self.load_items(&txn, order_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderConfirmed {
                order_id,
                payment_id: payment_row.id,
            })
            .await;

        info!(%order_id, payment_id = %payment_row.id, "order confirmed, payment issued");
        Ok(model_to_response(updated, items))
    }

    /// Cancels a pending or confirmed order. A blank reason is rejected;
    /// completed and already-cancelled orders cannot be cancelled.
    #[instrument(skip(self, request), fields(order_id = %order_id, admin_id = %admin_id))]
    pub async fn cancel(
        &self,
        order_id: Uuid,
        admin_id: Uuid,
        request: CancelOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let reason = request.reason.trim().to_string();
        if reason.is_empty() {
            return Err(ServiceError::ValidationError(
                "a cancellation reason is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if !order.status.can_cancel() {
            return Err(ServiceError::Conflict(format!(
                "order cannot be cancelled from status {}",
                order.status
            )));
        }

        let now = Utc::now();
        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.cancelled_by = Set(Some(admin_id));
        active.cancelled_at = Set(Some(now));
        active.cancellation_reason = Set(Some(reason.clone()));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let items = self.load_items(&txn, order_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCancelled { order_id, reason })
            .await;

        warn!(%order_id, "order cancelled");
        Ok(model_to_response(updated, items))
    }

    /// Advances the shipping axis. Moves are strictly forward along
    /// pending -> processing -> shipped -> delivered, and an order must be
    /// paid (payment status completed) before it can be shipped.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_shipping_status(
        &self,
        order_id: Uuid,
        new_status: ShippingStatus,
        _admin_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if !matches!(order.status, OrderStatus::Confirmed | OrderStatus::Completed) {
            return Err(ServiceError::Conflict(format!(
                "shipping cannot be updated while the order is {}",
                order.status
            )));
        }

        if !order.shipping_status.is_forward_move(new_status) {
            return Err(ServiceError::Conflict(format!(
                "shipping status cannot move from {} to {}",
                order.shipping_status, new_status
            )));
        }

        if new_status == ShippingStatus::Shipped
            && order.payment_status != OrderPaymentStatus::Completed
        {
            return Err(ServiceError::Conflict(
                "order must be paid before it can be shipped".to_string(),
            ));
        }

        let old_status = order.shipping_status;
        let now = Utc::now();
        let mut active: order::ActiveModel = order.into();
        active.shipping_status = Set(new_status);
        if new_status == ShippingStatus::Shipped {
            active.shipped_at = Set(Some(now));
        }
        if new_status == ShippingStatus::Delivered {
            active.delivered_at = Set(Some(now));
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let items = self.load_items(&txn, order_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ShippingStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        Ok(model_to_response(updated, items))
    }

    /// Admin override for the order-side payment status, kept for parity
    /// with the manual bookkeeping flow. The verification workflow is the
    /// normal way this field changes; the override refuses cancelled orders
    /// but imposes no transition order.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_payment_status(
        &self,
        order_id: Uuid,
        new_status: OrderPaymentStatus,
        _admin_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status == OrderStatus::Cancelled {
            return Err(ServiceError::Conflict(
                "payment status cannot change on a cancelled order".to_string(),
            ));
        }

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        let items = self.load_items(&txn, order_id).await?;
        txn.commit().await?;

        Ok(model_to_response(updated, items))
    }

    /// Store-side receipt confirmation. Requires the order to be shipped and
    /// not yet confirmed; completes the order.
    #[instrument(skip(self), fields(order_id = %order_id, store_id = %store_id))]
    pub async fn confirm_received(
        &self,
        order_id: Uuid,
        store_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .filter(|o| o.store_id == store_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.shipping_status != ShippingStatus::Shipped {
            return Err(ServiceError::Conflict(
                "receipt can only be confirmed once the order has shipped".to_string(),
            ));
        }
        if order.order_received_confirmation {
            return Err(ServiceError::Conflict(
                "receipt has already been confirmed".to_string(),
            ));
        }

        let now = Utc::now();
        let mut active: order::ActiveModel = order.into();
        active.order_received_confirmation = Set(true);
        active.order_received_at = Set(Some(now));
        active.status = Set(OrderStatus::Completed);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let items = self.load_items(&txn, order_id).await?;
        txn.commit().await?;

        self.event_sender.send_or_log(Event::OrderCompleted(order_id)).await;

        info!(%order_id, "order receipt confirmed; order completed");
        Ok(model_to_response(updated, items))
    }

    /// Fetches one order. Store callers only see their own; an order owned
    /// by another tenant reads as absent.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get(&self, order_id: Uuid, actor: Actor) -> Result<OrderResponse, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .filter(|o| match actor.store_scope() {
                Some(store_id) => o.store_id == store_id,
                None => true,
            })
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = self.load_items(&*self.db, order_id).await?;
        Ok(model_to_response(order, items))
    }

    /// Lists a store's own orders, newest first.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn list_by_store(
        &self,
        store_id: Uuid,
        status: Option<OrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        self.list(Some(store_id), status, page, per_page).await
    }

    /// Lists every order (admin view), optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        self.list(None, status, page, per_page).await
    }

    async fn list(
        &self,
        store_id: Option<Uuid>,
        status: Option<OrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut query = Order::find().order_by_desc(order::Column::CreatedAt);
        if let Some(store_id) = store_id {
            query = query.filter(order::Column::StoreId.eq(store_id));
        }
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
        if !order_ids.is_empty() {
            for item in OrderItem::find()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .all(&*self.db)
                .await?
            {
                items_by_order.entry(item.order_id).or_default().push(item);
            }
        }

        let orders = orders
            .into_iter()
            .map(|o| {
                let items = items_by_order.remove(&o.id).unwrap_or_default();
                model_to_response(o, items)
            })
            .collect();

        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }

    async fn load_items<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(conn)
            .await?)
    }
}

fn model_to_response(model: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
    let items = items
        .into_iter()
        .map(|item| OrderItemView {
            product_id: item.product_id,
            line_total: item.line_total(),
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();

    OrderResponse {
        id: model.id,
        order_number: model.order_number,
        store_id: model.store_id,
        status: model.status,
        payment_status: model.payment_status,
        shipping_status: model.shipping_status,
        total_amount: model.total_amount,
        shipping_address: model.shipping_address,
        payment_id: model.payment_id,
        confirmed_at: model.confirmed_at,
        cancelled_at: model.cancelled_at,
        cancellation_reason: model.cancellation_reason,
        shipped_at: model.shipped_at,
        delivered_at: model.delivered_at,
        order_received_confirmation: model.order_received_confirmation,
        order_received_at: model.order_received_at,
        created_at: model.created_at,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_are_prefixed_and_unique_enough() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert!(a.starts_with("ORD-"));
        assert_eq!(a.len(), 14);
        assert_ne!(a, b);
    }
}
