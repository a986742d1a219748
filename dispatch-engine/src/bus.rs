//! Event Bus - fan-out of domain events to external collaborators
//!
//! A `tokio::sync::broadcast` channel with a global monotonic sequence.
//! Publishers hold the per-order lock while publishing, so subscribers
//! observe each order's events in store-commit order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use shared::order::{EventPayload, OrderEvent};
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Fan-out bus for domain events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OrderEvent>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to all events from this point on
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }

    /// Build and publish an event, returning it.
    ///
    /// A send error only means no subscriber is currently listening; the
    /// engine does not require listeners to make progress.
    pub fn publish(&self, order_id: &str, timestamp: i64, payload: EventPayload) -> OrderEvent {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let event = OrderEvent::new(sequence, order_id.to_string(), timestamp, payload);
        tracing::debug!(
            order_id = %event.order_id,
            event_type = %event.event_type,
            sequence = event.sequence,
            "Publishing event"
        );
        let _ = self.tx.send(event.clone());
        event
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}
