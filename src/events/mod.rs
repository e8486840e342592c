use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the lifecycle services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartItemAdded { store_id: Uuid, product_id: Uuid },
    CartItemRemoved { store_id: Uuid, product_id: Uuid },
    CartCleared { store_id: Uuid },

    // Order events
    OrderCreated(Uuid),
    OrderConfirmed { order_id: Uuid, payment_id: Uuid },
    OrderCancelled { order_id: Uuid, reason: String },
    OrderCompleted(Uuid),
    ShippingStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Payment events
    PaymentInitiated { order_id: Uuid, payment_id: Uuid },
    PaymentSubmitted { payment_id: Uuid },
    PaymentVerified { payment_id: Uuid, approved: bool },

    // Address events
    DefaultAddressChanged { store_id: Uuid, address_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Event delivery is best-effort; it never fails the triggering request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(error = %e, ?event, "failed to publish event");
        }
    }
}

/// Consumes events from the channel and logs them. Runs until every sender
/// has been dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => info!(%order_id, "event: order created"),
            Event::OrderConfirmed { order_id, payment_id } => {
                info!(%order_id, %payment_id, "event: order confirmed")
            }
            Event::OrderCancelled { order_id, reason } => {
                info!(%order_id, %reason, "event: order cancelled")
            }
            Event::OrderCompleted(order_id) => info!(%order_id, "event: order completed"),
            Event::ShippingStatusChanged {
                order_id,
                old_status,
                new_status,
            } => info!(%order_id, %old_status, %new_status, "event: shipping status changed"),
            Event::PaymentInitiated { order_id, payment_id } => {
                info!(%order_id, %payment_id, "event: payment initiated")
            }
            Event::PaymentSubmitted { payment_id } => {
                info!(%payment_id, "event: payment transaction submitted")
            }
            Event::PaymentVerified { payment_id, approved } => {
                info!(%payment_id, approved = *approved, "event: payment verified")
            }
            other => info!(?other, "event"),
        }
    }
    info!("event channel closed; consumer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_does_not_fail_without_consumer() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out even though the receiver is gone.
        sender.send_or_log(Event::OrderCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_reach_the_consumer() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let order_id = Uuid::new_v4();
        sender.send(Event::OrderCreated(order_id)).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderCreated(id)) => assert_eq!(id, order_id),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
