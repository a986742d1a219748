//! Dispatcher - orchestrates the queue against the Order Store
//!
//! Listens on the bus for `OrderReadyForPickup`, fetches a ranked
//! candidate list from the rider pool and starts the offer cycle. On
//! `DispatchExhausted` it escalates with `NeedsManualDispatch` instead of
//! retrying forever; an operator re-enqueues via the manual redispatch
//! operation.

use std::sync::Arc;

use shared::order::{EventPayload, OrderEventType, OrderStatus};
use shared::{EngineError, EngineResult};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::clock::Clock;
use crate::dispatch::queue::DispatchQueue;
use crate::dispatch::riders::RiderPool;
use crate::orders::OrderStore;

#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<OrderStore>,
    queue: DispatchQueue,
    pool: Arc<dyn RiderPool>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    max_candidates: usize,
}

impl Dispatcher {
    pub fn new(
        store: Arc<OrderStore>,
        queue: DispatchQueue,
        pool: Arc<dyn RiderPool>,
        bus: EventBus,
        clock: Arc<dyn Clock>,
        max_candidates: usize,
    ) -> Self {
        Self {
            store,
            queue,
            pool,
            bus,
            clock,
            max_candidates,
        }
    }

    /// Run one dispatch cycle for an order: fetch candidates, install
    /// them, start the first offer. Also the manual redispatch entry
    /// point. The queue re-validates status and single-flight under the
    /// order's lock before anything changes.
    pub async fn dispatch(&self, order_id: &str) -> EngineResult<()> {
        let order = self.store.get(order_id).await?;
        if order.status != OrderStatus::ReadyForPickup {
            return Err(EngineError::Validation(format!(
                "order {} is not awaiting dispatch (status {})",
                order_id, order.status
            )));
        }
        let mut candidates = self.pool.candidates(&order).await;
        candidates.truncate(self.max_candidates);
        tracing::info!(
            order_id,
            candidates = candidates.len(),
            "Starting dispatch cycle"
        );
        self.queue.begin_cycle(order_id, candidates).await
    }

    /// Event loop: react to ready-for-pickup and exhaustion events until
    /// shutdown
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!("Dispatcher started");
        let mut rx = self.bus.subscribe();
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Ok(event) => self.handle(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Dispatcher lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.cancelled() => break,
            }
        }
        tracing::info!("Dispatcher stopped");
    }

    async fn handle(&self, event: shared::order::OrderEvent) {
        match event.event_type {
            OrderEventType::OrderReadyForPickup => {
                if let Err(e) = self.dispatch(&event.order_id).await {
                    tracing::error!(order_id = %event.order_id, error = %e, "Dispatch cycle failed");
                }
            }
            OrderEventType::DispatchExhausted => {
                tracing::warn!(order_id = %event.order_id, "No rider took the order, flagging for manual dispatch");
                self.bus.publish(
                    &event.order_id,
                    self.clock.now_millis(),
                    EventPayload::NeedsManualDispatch {},
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dispatch::riders::StaticRiderPool;
    use shared::order::{Actor, Order, OrderItem, TransitionAction};

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_candidate_list_is_truncated() {
        let store = Arc::new(OrderStore::new());
        let bus = EventBus::new();
        let clock = ManualClock::new(0);
        let queue = DispatchQueue::new(Arc::clone(&store), bus.clone(), clock.clone(), 60_000);
        let pool = Arc::new(StaticRiderPool::new(
            (1..=10).map(|i| format!("rider-{i}")).collect(),
        ));
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            queue,
            pool,
            bus.clone(),
            clock.clone(),
            3,
        );

        let order = Order::new(
            "cust-1",
            "rest-1",
            vec![OrderItem {
                sku: "sku-1".to_string(),
                quantity: 1,
                unit_price_cents: 100,
            }],
            0,
        );
        let id = order.id.clone();
        store.create(order).unwrap();
        for action in [
            TransitionAction::Accept,
            TransitionAction::MarkPreparing,
            TransitionAction::MarkReady,
        ] {
            store
                .transition(&id, Actor::Restaurant, action, None, 0)
                .await
                .unwrap();
        }

        dispatcher.dispatch(&id).await.unwrap();
        settle().await;

        // First offer out, two candidates left of the truncated three
        let cell = store.cell(&id).unwrap();
        let guard = cell.lock().await;
        assert_eq!(guard.dispatch.offers.len(), 1);
        assert_eq!(guard.dispatch.candidates.len(), 2);
    }
}
