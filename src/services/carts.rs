use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{cart, cart_item, product, Cart, CartItem, Product};
use crate::errors::{is_unique_violation, ServiceError};
use crate::events::{Event, EventSender};

/// Sums line totals over snapshot prices.
pub fn items_total<'a, I>(items: I) -> Decimal
where
    I: IntoIterator<Item = &'a cart_item::Model>,
{
    items
        .into_iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum()
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// A cart line with its product resolved for display.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub image: Option<String>,
    pub quantity: i32,
    /// Price snapshotted when the line was added.
    pub price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub store_id: Uuid,
    pub items: Vec<CartLine>,
    pub total: Decimal,
}

/// Per-store singleton cart: add, update, remove and clear line items.
///
/// Every operation is tenant-scoped; a store can only cart its own products.
/// Mutations run inside a transaction and the unique indexes on
/// `carts.store_id` and `cart_items (cart_id, product_id)` keep concurrent
/// read-modify-write calls from duplicating rows.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Adds a product to the store's cart, creating the cart lazily.
    ///
    /// An existing line for the same product has its quantity incremented;
    /// a new line snapshots the product's current price.
    #[instrument(skip(self), fields(store_id = %store_id, product_id = %input.product_id))]
    pub async fn add_item(
        &self,
        store_id: Uuid,
        input: AddItemRequest,
    ) -> Result<CartView, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let product = Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        if product.store_id != store_id {
            return Err(ServiceError::Forbidden(
                "products of another store cannot be added to this cart".to_string(),
            ));
        }

        let now = Utc::now();
        let cart = match Cart::find()
            .filter(cart::Column::StoreId.eq(store_id))
            .one(&txn)
            .await?
        {
            Some(existing) => existing,
            None => {
                let fresh = cart::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    store_id: Set(store_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                fresh.insert(&txn).await.map_err(|e| {
                    if is_unique_violation(&e) {
                        ServiceError::Conflict(
                            "cart was created by a concurrent request; retry".to_string(),
                        )
                    } else {
                        e.into()
                    }
                })?
            }
        };

        let existing_line = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        match existing_line {
            Some(line) => {
                let quantity = line.quantity + input.quantity;
                let mut line: cart_item::ActiveModel = line.into();
                line.quantity = Set(quantity);
                line.updated_at = Set(now);
                line.update(&txn).await?;
            }
            None => {
                let line = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    product_id: Set(input.product_id),
                    quantity: Set(input.quantity),
                    price: Set(product.price),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                line.insert(&txn).await.map_err(|e| {
                    if is_unique_violation(&e) {
                        ServiceError::Conflict(
                            "cart line was created by a concurrent request; retry".to_string(),
                        )
                    } else {
                        e.into()
                    }
                })?;
            }
        }

        let mut cart_touch: cart::ActiveModel = cart.into();
        cart_touch.updated_at = Set(now);
        cart_touch.update(&txn).await?;

        let view = self.load_view(&txn, store_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                store_id,
                product_id: input.product_id,
            })
            .await;

        info!(%store_id, product_id = %input.product_id, quantity = input.quantity, "cart item added");
        Ok(view)
    }

    /// Returns the store's cart with product details resolved. A store with
    /// no cart yet gets an empty view, not an error.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn get_cart(&self, store_id: Uuid) -> Result<CartView, ServiceError> {
        self.load_view(&*self.db, store_id).await
    }

    /// Overwrites a line's quantity; a quantity of zero or less removes the
    /// line instead.
    #[instrument(skip(self), fields(store_id = %store_id, product_id = %product_id))]
    pub async fn update_item(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity <= 0 {
            return self.remove_item(store_id, product_id).await;
        }

        let txn = self.db.begin().await?;

        let cart = Cart::find()
            .filter(cart::Column::StoreId.eq(store_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart not found".to_string()))?;

        let line = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} is not in the cart", product_id))
            })?;

        let mut line: cart_item::ActiveModel = line.into();
        line.quantity = Set(quantity);
        line.updated_at = Set(Utc::now());
        line.update(&txn).await?;

        let view = self.load_view(&txn, store_id).await?;
        txn.commit().await?;

        Ok(view)
    }

    /// Removes a line from the cart. Idempotent: a missing cart or line is a
    /// no-op, not an error.
    #[instrument(skip(self), fields(store_id = %store_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        store_id: Uuid,
        product_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = Cart::find()
            .filter(cart::Column::StoreId.eq(store_id))
            .one(&txn)
            .await?;

        let mut removed = false;
        if let Some(cart) = &cart {
            let result = CartItem::delete_many()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .filter(cart_item::Column::ProductId.eq(product_id))
                .exec(&txn)
                .await?;
            removed = result.rows_affected > 0;
        }

        let view = self.load_view(&txn, store_id).await?;
        txn.commit().await?;

        if removed {
            self.event_sender
                .send_or_log(Event::CartItemRemoved {
                    store_id,
                    product_id,
                })
                .await;
        }

        Ok(view)
    }

    /// Empties the cart.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn clear(&self, store_id: Uuid) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;

        if let Some(cart) = Cart::find()
            .filter(cart::Column::StoreId.eq(store_id))
            .one(&txn)
            .await?
        {
            CartItem::delete_many()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .exec(&txn)
                .await?;
        }

        let view = self.load_view(&txn, store_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCleared { store_id })
            .await;

        info!(%store_id, "cart cleared");
        Ok(view)
    }

    /// Builds the display view: lines joined with their products, plus the
    /// snapshot-price total. A product deleted after being carted keeps its
    /// line with a placeholder name.
    async fn load_view<C: ConnectionTrait>(
        &self,
        conn: &C,
        store_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let cart = Cart::find()
            .filter(cart::Column::StoreId.eq(store_id))
            .one(conn)
            .await?;

        let items = match &cart {
            Some(cart) => {
                CartItem::find()
                    .filter(cart_item::Column::CartId.eq(cart.id))
                    .all(conn)
                    .await?
            }
            None => Vec::new(),
        };

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, product::Model> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            Product::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(conn)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let total = items_total(&items);
        let lines = items
            .into_iter()
            .map(|item| {
                let product = products.get(&item.product_id);
                CartLine {
                    product_id: item.product_id,
                    product_name: product
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| format!("Product {}", item.product_id)),
                    image: product.and_then(|p| p.image.clone()),
                    quantity: item.quantity,
                    price: item.price,
                    line_total: item.line_total(),
                }
            })
            .collect();

        Ok(CartView {
            store_id,
            items: lines,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(price: Decimal, quantity: i32) -> cart_item::Model {
        cart_item::Model {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            price,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn total_uses_snapshot_prices() {
        let items = vec![line(dec!(100), 2), line(dec!(19.99), 3)];
        assert_eq!(items_total(&items), dec!(259.97));
    }

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(items_total(&[]), Decimal::ZERO);
    }
}
