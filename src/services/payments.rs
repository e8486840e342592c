use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::order::OrderPaymentStatus;
use crate::entities::payment::PaymentStatus;
use crate::entities::{order, payment, Order, Payment};
use crate::errors::{is_unique_violation, ServiceError};
use crate::events::{Event, EventSender};
use crate::services::Actor;

/// The only payment method in this workflow: the store scans a QR code and
/// reports the resulting transaction id for manual verification.
pub const QR_CODE_METHOD: &str = "qr_code";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitTransactionRequest {
    pub transaction_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub approve: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub qr_code_url: String,
    pub transaction_id: Option<String>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Inserts the single payment row for an order.
///
/// Shared by order confirmation and standalone initiation; both run it
/// inside their own transaction. The unique index on `payments.order_id`
/// turns a lost race into a Conflict instead of a duplicate row.
pub(crate) async fn create_payment_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    amount: Decimal,
    qr_code_url: &str,
) -> Result<payment::Model, ServiceError> {
    let now = Utc::now();
    let row = payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        amount: Set(amount),
        payment_method: Set(QR_CODE_METHOD.to_string()),
        status: Set(PaymentStatus::Pending),
        qr_code_url: Set(qr_code_url.to_string()),
        transaction_id: Set(None),
        receipt_url: Set(None),
        verified_by: Set(None),
        verified_at: Set(None),
        paid_at: Set(None),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    row.insert(conn).await.map_err(|e| {
        if is_unique_violation(&e) {
            ServiceError::Conflict(format!("a payment already exists for order {}", order_id))
        } else {
            e.into()
        }
    })
}

/// Drives payments through pending -> submitted -> verified | failed and
/// propagates the outcome onto the order's payment status.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    config: Arc<AppConfig>,
}

impl PaymentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, config: Arc<AppConfig>) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Issues a payment for a confirmed order that does not have one yet.
    ///
    /// Order confirmation normally does this; the standalone operation
    /// covers orders confirmed before payment issuing existed. A second
    /// initiation always fails with Conflict.
    #[instrument(skip(self), fields(order_id = %order_id, admin_id = %admin_id))]
    pub async fn initiate(&self, order_id: Uuid, admin_id: Uuid) -> Result<PaymentResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status != crate::entities::order::OrderStatus::Confirmed {
            return Err(ServiceError::Conflict(format!(
                "payment can only be initiated for a confirmed order (status is {})",
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

        let mut active: order::ActiveModel = order.into();
        active.payment_id = Set(Some(payment_row.id));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentInitiated {
                order_id,
                payment_id: payment_row.id,
            })
            .await;

        info!(%order_id, payment_id = %payment_row.id, "payment initiated");
        Ok(model_to_response(payment_row))
    }

    /// Records the transaction id the store observed after paying by QR.
    ///
    /// Allowed while the payment is pending or submitted (resubmission
    /// overwrites the previous id); rejected once the payment reached a
    /// terminal state. `paid_at` is set on the first submission only.
    #[instrument(skip(self, request), fields(order_id = %order_id, store_id = %store_id))]
    pub async fn submit_transaction(
        &self,
        order_id: Uuid,
        store_id: Uuid,
        request: SubmitTransactionRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        let transaction_id = request.transaction_id.trim().to_string();
        if transaction_id.is_empty() {
            return Err(ServiceError::ValidationError(
                "a transaction id is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .filter(|o| o.store_id == store_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let payment_row = Payment::find()
            .filter(payment::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "no payment has been initiated for order {}",
                    order_id
                ))
            })?;

        if payment_row.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "payment is already {}",
                payment_row.status
            )));
        }

        let now = Utc::now();
        let paid_at = payment_row.paid_at;
        let payment_id = payment_row.id;
        let mut active: payment::ActiveModel = payment_row.into();
        active.transaction_id = Set(Some(transaction_id));
        active.status = Set(PaymentStatus::Submitted);
        active.paid_at = Set(paid_at.or(Some(now)));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let mut order_active: order::ActiveModel = order.into();
        order_active.payment_status = Set(OrderPaymentStatus::Submitted);
        order_active.updated_at = Set(now);
        order_active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentSubmitted { payment_id })
            .await;

        info!(%order_id, %payment_id, "transaction id submitted");
        Ok(model_to_response(updated))
    }

    /// Admin verdict on a submitted payment.
    ///
    /// Approval marks the payment verified and the order's payment status
    /// completed; rejection marks both failed. The asymmetric wording
    /// (payment "verified", order "completed") is part of the interface.
    #[instrument(skip(self, request), fields(payment_id = %payment_id, admin_id = %admin_id, approve = request.approve))]
    pub async fn verify(
        &self,
        payment_id: Uuid,
        admin_id: Uuid,
        request: VerifyPaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let payment_row = Payment::find_by_id(payment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        if payment_row.status != PaymentStatus::Submitted {
            return Err(ServiceError::Conflict(format!(
                "only submitted payments can be verified (status is {})",
                payment_row.status
            )));
        }

        let order = Order::find_by_id(payment_row.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "payment {} references missing order {}",
                    payment_id, payment_row.order_id
                ))
            })?;

        let now = Utc::now();
        let approved = request.approve;
        let mut active: payment::ActiveModel = payment_row.into();
        active.status = Set(if approved {
            PaymentStatus::Verified
        } else {
            PaymentStatus::Failed
        });
        active.verified_by = Set(Some(admin_id));
        active.verified_at = Set(Some(now));
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let mut order_active: order::ActiveModel = order.into();
        order_active.payment_status = Set(if approved {
            OrderPaymentStatus::Completed
        } else {
            OrderPaymentStatus::Failed
        });
        order_active.updated_at = Set(now);
        order_active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentVerified {
                payment_id,
                approved,
            })
            .await;

        if approved {
            info!(%payment_id, "payment verified");
        } else {
            warn!(%payment_id, "payment rejected");
        }
        Ok(model_to_response(updated))
    }

    /// Fetches one payment. Store callers only see payments tied to their
    /// own orders.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn get(&self, payment_id: Uuid, actor: Actor) -> Result<PaymentResponse, ServiceError> {
        let payment_row = Payment::find_by_id(payment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        if let Some(store_id) = actor.store_scope() {
            let owns = Order::find_by_id(payment_row.order_id)
                .one(&*self.db)
                .await?
                .map(|o| o.store_id == store_id)
                .unwrap_or(false);
            if !owns {
                return Err(ServiceError::NotFound(format!(
                    "Payment {} not found",
                    payment_id
                )));
            }
        }

        Ok(model_to_response(payment_row))
    }
}

fn model_to_response(model: payment::Model) -> PaymentResponse {
    PaymentResponse {
        id: model.id,
        order_id: model.order_id,
        amount: model.amount,
        payment_method: model.payment_method,
        status: model.status,
        qr_code_url: model.qr_code_url,
        transaction_id: model.transaction_id,
        verified_by: model.verified_by,
        verified_at: model.verified_at,
        paid_at: model.paid_at,
        notes: model.notes,
        created_at: model.created_at,
    }
}
