use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published by the services after successful persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeactivated(Uuid),

    // Cart events
    CartCreated(Uuid),
    CartItemAdded {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemUpdated {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved {
        cart_id: Uuid,
        product_id: Uuid,
    },
    CartCleared(Uuid),

    // Review events
    ReviewAdded {
        product_id: Uuid,
        user_id: Uuid,
        rating: i32,
    },
}

/// Cloneable handle for publishing events onto the process-wide channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failures to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging (rather than propagating) channel failures.
    /// Event delivery is fire-and-forget; a full or closed channel must not
    /// fail the request that produced the event.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Consumes events from the channel until all senders are dropped.
///
/// The storefront has no out-of-process subscribers; events are logged for
/// operational visibility and the loop doubles as the single place to hang
/// future handlers off.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CartItemAdded {
                cart_id,
                product_id,
                quantity,
            } => {
                info!(%cart_id, %product_id, quantity, "cart item added");
            }
            Event::CartItemRemoved {
                cart_id,
                product_id,
            } => {
                info!(%cart_id, %product_id, "cart item removed");
            }
            Event::ReviewAdded {
                product_id,
                user_id,
                rating,
            } => {
                info!(%product_id, %user_id, rating, "review added");
            }
            other => info!(event = ?other, "event processed"),
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::ProductCreated(Uuid::new_v4()))
            .await
            .expect("send should succeed");

        assert!(matches!(rx.recv().await, Some(Event::ProductCreated(_))));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out even though the receiver is gone.
        sender.send_or_log(Event::CartCleared(Uuid::new_v4())).await;
    }
}
