//! Order Store - the authoritative map of order id to order aggregate
//!
//! Each order lives in an [`OrderCell`] behind its own `tokio::sync::Mutex`;
//! that mutex is the per-order exclusive lock of the concurrency model.
//! The cell also carries the order's dispatch state (candidate list, offer
//! history, timer handle) so state transitions and offer resolution for one
//! order are serialized behind a single lock acquisition. Critical sections
//! are tiny; lock waits are bounded and sub-millisecond in practice.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use shared::dispatch::{DispatchOffer, OfferState};
use shared::order::{Actor, Order, TransitionAction};
use shared::{EngineError, EngineResult};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::machine;

// ============================================================================
// Dispatch state (owned by the lock holder)
// ============================================================================

/// Per-order dispatch bookkeeping. Only ever touched while holding the
/// order's cell lock.
#[derive(Debug, Default)]
pub struct DispatchState {
    /// Remaining candidates for the current dispatch cycle, in the order
    /// the ranking collaborator provided them
    pub candidates: VecDeque<String>,
    /// Append-only offer history (audit); the last entry is the only one
    /// that can be `Pending`
    pub offers: Vec<DispatchOffer>,
    /// Cancellation handle for the pending offer's expiry timer
    pub timer: Option<CancellationToken>,
    /// Offers made during the current dispatch cycle
    pub offers_made: usize,
}

impl DispatchState {
    /// The single in-flight offer, if any
    pub fn pending_offer(&self) -> Option<&DispatchOffer> {
        self.offers.last().filter(|o| o.state == OfferState::Pending)
    }

    pub fn pending_offer_mut(&mut self) -> Option<&mut DispatchOffer> {
        self.offers
            .last_mut()
            .filter(|o| o.state == OfferState::Pending)
    }

    /// Cancel the pending expiry timer, if armed
    pub fn cancel_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
    }
}

// ============================================================================
// Order cell
// ============================================================================

/// One order plus its dispatch state, guarded by one mutex
#[derive(Debug)]
pub struct OrderCell {
    pub order: Order,
    pub dispatch: DispatchState,
}

impl OrderCell {
    fn new(order: Order) -> Self {
        Self {
            order,
            dispatch: DispatchState::default(),
        }
    }

    /// Apply a transition atomically: validate the expected version, run
    /// the state machine, then write `(new status, version + 1)`.
    ///
    /// On any error the order is left untouched.
    pub fn apply(
        &mut self,
        actor: Actor,
        action: TransitionAction,
        expected_version: Option<u64>,
        now: i64,
    ) -> EngineResult<()> {
        if let Some(expected) = expected_version
            && expected != self.order.version
        {
            return Err(EngineError::ConcurrentModification {
                expected,
                actual: self.order.version,
            });
        }

        let next = machine::next_status(self.order.status, actor, action)?;
        self.order.status = next;
        self.order.version += 1;
        self.order.status_changed_at = now;
        Ok(())
    }
}

// ============================================================================
// Order store
// ============================================================================

/// Keyed, lockable store. The store itself holds no locks across calls;
/// callers lock individual cells.
#[derive(Debug, Default)]
pub struct OrderStore {
    cells: DashMap<String, Arc<Mutex<OrderCell>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new order; fails with `DuplicateOrder` if the id exists
    pub fn create(&self, order: Order) -> EngineResult<()> {
        match self.cells.entry(order.id.clone()) {
            dashmap::Entry::Occupied(_) => Err(EngineError::DuplicateOrder(order.id)),
            dashmap::Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(OrderCell::new(order))));
                Ok(())
            }
        }
    }

    /// Fetch the cell for an order so the caller can run a multi-step
    /// mutation under one lock acquisition
    pub fn cell(&self, order_id: &str) -> EngineResult<Arc<Mutex<OrderCell>>> {
        self.cells
            .get(order_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::NotFound(format!("order {}", order_id)))
    }

    /// Snapshot read - a clone taken under the cell lock, never partial
    pub async fn get(&self, order_id: &str) -> EngineResult<Order> {
        let cell = self.cell(order_id)?;
        let guard = cell.lock().await;
        Ok(guard.order.clone())
    }

    /// Apply a single transition under the order's lock and return the
    /// updated snapshot
    pub async fn transition(
        &self,
        order_id: &str,
        actor: Actor,
        action: TransitionAction,
        expected_version: Option<u64>,
        now: i64,
    ) -> EngineResult<Order> {
        let cell = self.cell(order_id)?;
        let mut guard = cell.lock().await;
        guard.apply(actor, action, expected_version, now)?;
        Ok(guard.order.clone())
    }

    /// Append-only offer history for audit
    pub async fn offer_history(&self, order_id: &str) -> EngineResult<Vec<DispatchOffer>> {
        let cell = self.cell(order_id)?;
        let guard = cell.lock().await;
        Ok(guard.dispatch.offers.clone())
    }

    /// Number of orders held (active and terminal)
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{OrderItem, OrderStatus};

    fn test_order() -> Order {
        Order::new(
            "cust-1",
            "rest-1",
            vec![OrderItem {
                sku: "sku-1".to_string(),
                quantity: 1,
                unit_price_cents: 500,
            }],
            1_000,
        )
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = OrderStore::new();
        let order = test_order();
        let id = order.id.clone();
        store.create(order.clone()).unwrap();
        assert_eq!(store.create(order), Err(EngineError::DuplicateOrder(id)));
    }

    #[tokio::test]
    async fn test_get_unknown_order_is_not_found() {
        let store = OrderStore::new();
        assert_eq!(
            store.get("missing").await,
            Err(EngineError::NotFound("order missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_transition_bumps_version_and_timestamp() {
        let store = OrderStore::new();
        let order = test_order();
        let id = order.id.clone();
        store.create(order).unwrap();

        let updated = store
            .transition(&id, Actor::Restaurant, TransitionAction::Accept, None, 2_000)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Accepted);
        assert_eq!(updated.version, 2);
        assert_eq!(updated.status_changed_at, 2_000);
    }

    #[tokio::test]
    async fn test_version_mismatch_is_concurrent_modification() {
        let store = OrderStore::new();
        let order = test_order();
        let id = order.id.clone();
        store.create(order).unwrap();

        let err = store
            .transition(
                &id,
                Actor::Restaurant,
                TransitionAction::Accept,
                Some(99),
                2_000,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::ConcurrentModification {
                expected: 99,
                actual: 1
            }
        );
        // No silent overwrite
        assert_eq!(store.get(&id).await.unwrap().status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_state_unchanged() {
        let store = OrderStore::new();
        let order = test_order();
        let id = order.id.clone();
        store.create(order).unwrap();

        let err = store
            .transition(&id, Actor::Rider, TransitionAction::Deliver, None, 2_000)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));

        let snapshot = store.get(&id).await.unwrap();
        assert_eq!(snapshot.status, OrderStatus::Placed);
        assert_eq!(snapshot.version, 1);
    }
}
