//! OrderEngine - the call surface external collaborators consume
//!
//! Owns the store, queue, dispatcher and bus, and enforces the actor
//! checks the UI layers used to reimplement inconsistently. Every
//! mutation runs under the target order's cell lock; events go out on the
//! bus in commit order.

use std::sync::Arc;

use shared::dispatch::DispatchOffer;
use shared::order::{
    Actor, EventPayload, Order, OrderEvent, OrderItem, RestaurantAction, RiderAction,
    RiderResponse, TransitionAction,
};
use shared::{EngineError, EngineResult};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::clock::Clock;
use crate::core::EngineConfig;
use crate::dispatch::queue::DispatchQueue;
use crate::dispatch::riders::RiderPool;
use crate::dispatch::Dispatcher;
use crate::orders::OrderStore;

pub struct OrderEngine {
    store: Arc<OrderStore>,
    queue: DispatchQueue,
    dispatcher: Dispatcher,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl OrderEngine {
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>, pool: Arc<dyn RiderPool>) -> Arc<Self> {
        let store = Arc::new(OrderStore::new());
        let bus = EventBus::new();
        let queue = DispatchQueue::new(
            Arc::clone(&store),
            bus.clone(),
            Arc::clone(&clock),
            config.offer_ttl_ms,
        );
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            queue.clone(),
            pool,
            bus.clone(),
            Arc::clone(&clock),
            config.max_dispatch_candidates,
        );
        Arc::new(Self {
            store,
            queue,
            dispatcher,
            bus,
            clock,
            config,
        })
    }

    /// Spawn the dispatcher event loop; it stops when `shutdown` fires
    pub fn start(&self, shutdown: CancellationToken) {
        tokio::spawn(self.dispatcher.clone().run(shutdown));
    }

    /// Subscribe to domain events from this point on
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.bus.subscribe()
    }

    // ========================================================================
    // Order intake
    // ========================================================================

    /// Create an order in `Placed` and publish `OrderCreated`
    pub async fn create_order(
        &self,
        customer_id: &str,
        restaurant_id: &str,
        items: Vec<OrderItem>,
    ) -> EngineResult<Order> {
        validate_new_order(customer_id, restaurant_id, &items)?;

        let now = self.clock.now_millis();
        let order = Order::new(customer_id, restaurant_id, items, now);
        let snapshot = order.clone();
        self.store.create(order)?;

        tracing::info!(
            order_id = %snapshot.id,
            restaurant_id,
            total_cents = snapshot.total_cents,
            "Order created"
        );
        self.bus.publish(
            &snapshot.id,
            now,
            EventPayload::OrderCreated {
                customer_id: snapshot.customer_id.clone(),
                restaurant_id: snapshot.restaurant_id.clone(),
                total_cents: snapshot.total_cents,
                item_count: snapshot.items.len(),
            },
        );
        Ok(snapshot)
    }

    // ========================================================================
    // Restaurant surface
    // ========================================================================

    pub async fn restaurant_transition(
        &self,
        order_id: &str,
        action: RestaurantAction,
        actor_id: &str,
    ) -> EngineResult<Order> {
        let cell = self.store.cell(order_id)?;
        let mut guard = cell.lock().await;

        if guard.order.restaurant_id != actor_id {
            return Err(EngineError::Validation(format!(
                "actor {} is not the restaurant for order {}",
                actor_id, order_id
            )));
        }

        let now = self.clock.now_millis();
        match action {
            RestaurantAction::Accept => {
                guard.apply(Actor::Restaurant, TransitionAction::Accept, None, now)?;
                self.bus.publish(order_id, now, EventPayload::OrderAccepted {});
            }
            RestaurantAction::Reject => {
                // Rejection rides the cancel edge, same policy gate included
                return self.cancel_locked(
                    &mut guard,
                    Actor::Restaurant,
                    order_id,
                    actor_id,
                    Some("rejected by restaurant".to_string()),
                );
            }
            RestaurantAction::MarkPreparing => {
                // Status-only change; the canonical event stream has no
                // preparing event
                guard.apply(Actor::Restaurant, TransitionAction::MarkPreparing, None, now)?;
            }
            RestaurantAction::MarkReady => {
                guard.apply(Actor::Restaurant, TransitionAction::MarkReady, None, now)?;
                self.bus
                    .publish(order_id, now, EventPayload::OrderReadyForPickup {});
            }
        }
        Ok(guard.order.clone())
    }

    // ========================================================================
    // Rider surface
    // ========================================================================

    /// Respond to the pending dispatch offer
    pub async fn rider_respond(
        &self,
        order_id: &str,
        rider_id: &str,
        response: RiderResponse,
    ) -> EngineResult<Order> {
        match response {
            RiderResponse::Accept => self.queue.accept(order_id, rider_id).await,
            RiderResponse::Decline => self.queue.decline(order_id, rider_id).await,
        }
    }

    /// Progress an assigned order through pickup and delivery
    pub async fn rider_transition(
        &self,
        order_id: &str,
        rider_id: &str,
        action: RiderAction,
    ) -> EngineResult<Order> {
        let cell = self.store.cell(order_id)?;
        let mut guard = cell.lock().await;

        if guard.order.rider_id.as_deref() != Some(rider_id) {
            return Err(EngineError::Validation(format!(
                "rider {} is not assigned to order {}",
                rider_id, order_id
            )));
        }

        let now = self.clock.now_millis();
        guard.apply(Actor::Rider, action.transition(), None, now)?;

        let rider_id = rider_id.to_string();
        let payload = match action {
            RiderAction::PickedUp => EventPayload::OrderPickedUp { rider_id },
            RiderAction::OnTheWay => EventPayload::OrderOnTheWay { rider_id },
            RiderAction::Delivered => EventPayload::OrderDelivered { rider_id },
        };
        self.bus.publish(order_id, now, payload);
        Ok(guard.order.clone())
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancel an order on behalf of its customer or restaurant.
    ///
    /// Any pending dispatch offer is resolved as `Superseded` and its
    /// timer disarmed in the same critical section as the status flip, so
    /// a late timeout callback finds nothing to act on.
    pub async fn cancel_order(
        &self,
        order_id: &str,
        actor_id: &str,
        reason: Option<String>,
    ) -> EngineResult<Order> {
        let cell = self.store.cell(order_id)?;
        let mut guard = cell.lock().await;

        let actor = if guard.order.customer_id == actor_id {
            Actor::Customer
        } else if guard.order.restaurant_id == actor_id {
            Actor::Restaurant
        } else {
            return Err(EngineError::Validation(format!(
                "actor {} may not cancel order {}",
                actor_id, order_id
            )));
        };

        self.cancel_locked(&mut guard, actor, order_id, actor_id, reason)
    }

    /// Shared cancel path: policy gate, then the transition, then offer
    /// supersession. Nothing is mutated unless the transition succeeds.
    fn cancel_locked(
        &self,
        guard: &mut crate::orders::OrderCell,
        actor: Actor,
        order_id: &str,
        actor_id: &str,
        reason: Option<String>,
    ) -> EngineResult<Order> {
        if !self.config.cancellable_statuses.contains(&guard.order.status) {
            return Err(EngineError::InvalidTransition {
                from: guard.order.status,
                requested: shared::order::OrderStatus::Cancelled,
            });
        }

        let now = self.clock.now_millis();
        guard.apply(actor, TransitionAction::Cancel, None, now)?;
        let superseded = DispatchQueue::supersede_pending(guard);

        tracing::info!(order_id, actor_id, superseded, "Order cancelled");
        self.bus.publish(
            order_id,
            now,
            EventPayload::OrderCancelled {
                actor_id: actor_id.to_string(),
                reason,
            },
        );
        Ok(guard.order.clone())
    }

    // ========================================================================
    // Dispatch control and reads
    // ========================================================================

    /// Manually re-run a dispatch cycle for an order stuck in
    /// `ReadyForPickup` after `DispatchExhausted`
    pub async fn redispatch(&self, order_id: &str) -> EngineResult<()> {
        self.dispatcher.dispatch(order_id).await
    }

    /// Snapshot read of an order
    pub async fn get_order(&self, order_id: &str) -> EngineResult<Order> {
        self.store.get(order_id).await
    }

    /// Append-only offer audit trail for an order
    pub async fn offer_history(&self, order_id: &str) -> EngineResult<Vec<DispatchOffer>> {
        self.store.offer_history(order_id).await
    }
}

fn validate_new_order(
    customer_id: &str,
    restaurant_id: &str,
    items: &[OrderItem],
) -> EngineResult<()> {
    if customer_id.is_empty() {
        return Err(EngineError::Validation("customer_id must not be empty".into()));
    }
    if restaurant_id.is_empty() {
        return Err(EngineError::Validation(
            "restaurant_id must not be empty".into(),
        ));
    }
    if items.is_empty() {
        return Err(EngineError::Validation(
            "order must contain at least one item".into(),
        ));
    }
    for item in items {
        if item.sku.is_empty() {
            return Err(EngineError::Validation("item sku must not be empty".into()));
        }
        if item.quantity == 0 {
            return Err(EngineError::Validation(format!(
                "item {} quantity must be at least 1",
                item.sku
            )));
        }
        if item.unit_price_cents < 0 {
            return Err(EngineError::Validation(format!(
                "item {} unit price must not be negative",
                item.sku
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dispatch::riders::StaticRiderPool;
    use shared::order::OrderStatus;

    fn engine_with(riders: &[&str]) -> (Arc<OrderEngine>, Arc<ManualClock>) {
        let clock = ManualClock::new(0);
        let pool = Arc::new(StaticRiderPool::new(
            riders.iter().map(|r| r.to_string()).collect(),
        ));
        let engine = OrderEngine::new(EngineConfig::default(), clock.clone(), pool);
        (engine, clock)
    }

    fn items() -> Vec<OrderItem> {
        vec![OrderItem {
            sku: "sku-1".to_string(),
            quantity: 2,
            unit_price_cents: 450,
        }]
    }

    #[tokio::test]
    async fn test_create_order_validation() {
        let (engine, _) = engine_with(&[]);

        assert!(matches!(
            engine.create_order("", "rest-1", items()).await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.create_order("cust-1", "rest-1", vec![]).await,
            Err(EngineError::Validation(_))
        ));
        let bad_qty = vec![OrderItem {
            sku: "sku-1".to_string(),
            quantity: 0,
            unit_price_cents: 100,
        }];
        assert!(matches!(
            engine.create_order("cust-1", "rest-1", bad_qty).await,
            Err(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_restaurant_actor_check() {
        let (engine, _) = engine_with(&[]);
        let order = engine.create_order("cust-1", "rest-1", items()).await.unwrap();

        let err = engine
            .restaurant_transition(&order.id, RestaurantAction::Accept, "rest-2")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reject_cancels_before_dispatch() {
        let (engine, _) = engine_with(&[]);
        let order = engine.create_order("cust-1", "rest-1", items()).await.unwrap();

        let rejected = engine
            .restaurant_transition(&order.id, RestaurantAction::Reject, "rest-1")
            .await
            .unwrap();
        assert_eq!(rejected.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_by_stranger_is_rejected() {
        let (engine, _) = engine_with(&[]);
        let order = engine.create_order("cust-1", "rest-1", items()).await.unwrap();

        let err = engine
            .cancel_order(&order.id, "someone-else", None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rider_transition_requires_assignment() {
        let (engine, _) = engine_with(&[]);
        let order = engine.create_order("cust-1", "rest-1", items()).await.unwrap();

        let err = engine
            .rider_transition(&order.id, "rider-a", RiderAction::PickedUp)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
