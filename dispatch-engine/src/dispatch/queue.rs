//! Dispatch Queue - per-order candidate list and the single active offer
//!
//! One offer is in flight per order at any instant (single-flight). Every
//! resolution path - accept, decline, expiry, supersede - runs under the
//! order's cell lock, and expiry is driven by the Clock source rather than
//! polling. A timeout callback that fires late re-checks order status and
//! offer identity under the lock before acting, so it can never resurrect
//! dispatch on a cancelled or assigned order.

use std::sync::Arc;

use shared::dispatch::{DispatchOffer, OfferState};
use shared::order::{Actor, EventPayload, Order, OrderStatus, TransitionAction};
use shared::{EngineError, EngineResult};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::clock::Clock;
use crate::orders::{OrderCell, OrderStore};

/// Time-boxed offer sequencing for orders awaiting pickup
#[derive(Clone)]
pub struct DispatchQueue {
    store: Arc<OrderStore>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    offer_ttl_ms: i64,
}

impl DispatchQueue {
    pub fn new(store: Arc<OrderStore>, bus: EventBus, clock: Arc<dyn Clock>, offer_ttl_ms: i64) -> Self {
        Self {
            store,
            bus,
            clock,
            offer_ttl_ms,
        }
    }

    // ========================================================================
    // Candidate management
    // ========================================================================

    /// Install the candidate list and offer to the first candidate, as one
    /// critical section. The caller decides the ordering policy (e.g.
    /// nearest-first); the queue only consumes it.
    ///
    /// Refused while an offer is still pending: the single-flight invariant
    /// means a cycle can only start once the previous offer is resolved.
    pub async fn begin_cycle(&self, order_id: &str, rider_ids: Vec<String>) -> EngineResult<()> {
        let cell = self.store.cell(order_id)?;
        let mut guard = cell.lock().await;

        if guard.order.status != OrderStatus::ReadyForPickup {
            return Err(EngineError::Validation(format!(
                "order {} is not awaiting dispatch (status {})",
                order_id, guard.order.status
            )));
        }
        if guard.dispatch.pending_offer().is_some() {
            return Err(EngineError::Validation(format!(
                "order {} already has an offer in flight",
                order_id
            )));
        }

        guard.dispatch.candidates = rider_ids.into();
        guard.dispatch.offers_made = 0;
        self.start_next_locked(order_id, &cell, &mut guard);
        Ok(())
    }

    /// Advance the queue while already holding the cell lock.
    ///
    /// With no candidates left this publishes `DispatchExhausted` and the
    /// order stays `ReadyForPickup`; re-enqueueing is the caller's call.
    fn start_next_locked(
        &self,
        order_id: &str,
        cell: &Arc<Mutex<OrderCell>>,
        guard: &mut OrderCell,
    ) {
        debug_assert!(guard.dispatch.pending_offer().is_none());

        let Some(rider_id) = guard.dispatch.candidates.pop_front() else {
            tracing::info!(
                order_id,
                offers_made = guard.dispatch.offers_made,
                "Dispatch exhausted, escalating"
            );
            self.bus.publish(
                order_id,
                self.clock.now_millis(),
                EventPayload::DispatchExhausted {
                    offers_made: guard.dispatch.offers_made,
                },
            );
            return;
        };

        let now = self.clock.now_millis();
        let expires_at = now + self.offer_ttl_ms;
        let offer = DispatchOffer::new(order_id.to_string(), rider_id.clone(), now, expires_at);
        let offer_id = offer.offer_id.clone();
        guard.dispatch.offers.push(offer);
        guard.dispatch.offers_made += 1;

        let token = CancellationToken::new();
        guard.dispatch.timer = Some(token.clone());

        tracing::info!(order_id, rider_id = %rider_id, expires_at, "Offering order to rider");
        self.bus.publish(
            order_id,
            now,
            EventPayload::RiderOffered {
                rider_id,
                expires_at,
            },
        );

        // Expiry timer: owned by the clock source, cancelled via the token
        // held in the cell
        let queue = self.clone();
        let cell = Arc::clone(cell);
        let order_id = order_id.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = queue.clock.sleep_until(expires_at) => {
                    queue.handle_timeout(&order_id, &cell, &offer_id).await;
                }
                _ = token.cancelled() => {}
            }
        });
    }

    /// Timeout path - the only resolution that runs without an external
    /// caller
    async fn handle_timeout(&self, order_id: &str, cell: &Arc<Mutex<OrderCell>>, offer_id: &str) {
        let mut guard = cell.lock().await;

        // Re-check under the lock: the offer may have been resolved or the
        // order cancelled between the timer firing and the lock acquisition
        if guard.order.status != OrderStatus::ReadyForPickup {
            tracing::debug!(order_id, status = %guard.order.status, "Stale offer timeout ignored");
            return;
        }
        let Some(pending) = guard.dispatch.pending_offer_mut() else {
            return;
        };
        if pending.offer_id != offer_id {
            return;
        }

        tracing::info!(order_id, rider_id = %pending.rider_id, "Offer expired");
        pending.state = OfferState::Expired;
        guard.dispatch.timer = None;
        self.start_next_locked(order_id, cell, &mut guard);
    }

    // ========================================================================
    // Rider responses
    // ========================================================================

    /// Accept the pending offer. The deadline check is time-based: an
    /// accept at or after `expires_at` fails with `OfferExpired` even if
    /// the timeout callback has not fired yet.
    pub async fn accept(&self, order_id: &str, rider_id: &str) -> EngineResult<Order> {
        let cell = self.store.cell(order_id)?;
        let mut guard = cell.lock().await;

        let now = self.clock.now_millis();
        {
            let offer = guard
                .dispatch
                .pending_offer()
                .ok_or(EngineError::OfferAlreadyResolved)?;
            if offer.rider_id != rider_id {
                return Err(EngineError::Validation(format!(
                    "pending offer for order {} is not addressed to rider {}",
                    order_id, rider_id
                )));
            }
            if offer.is_expired(now) {
                return Err(EngineError::OfferExpired);
            }
        }

        guard.apply(Actor::Dispatcher, TransitionAction::AssignRider, None, now)?;
        guard.order.rider_id = Some(rider_id.to_string());
        if let Some(offer) = guard.dispatch.pending_offer_mut() {
            offer.state = OfferState::Accepted;
        }
        guard.dispatch.cancel_timer();

        tracing::info!(order_id, rider_id, "Rider accepted offer");
        self.bus.publish(
            order_id,
            now,
            EventPayload::RiderAssigned {
                rider_id: rider_id.to_string(),
            },
        );
        Ok(guard.order.clone())
    }

    /// Decline the pending offer and immediately move to the next candidate
    pub async fn decline(&self, order_id: &str, rider_id: &str) -> EngineResult<Order> {
        let cell = self.store.cell(order_id)?;
        let mut guard = cell.lock().await;

        {
            let offer = guard
                .dispatch
                .pending_offer()
                .ok_or(EngineError::OfferAlreadyResolved)?;
            if offer.rider_id != rider_id {
                return Err(EngineError::Validation(format!(
                    "pending offer for order {} is not addressed to rider {}",
                    order_id, rider_id
                )));
            }
        }

        if let Some(offer) = guard.dispatch.pending_offer_mut() {
            offer.state = OfferState::Declined;
        }
        guard.dispatch.cancel_timer();

        tracing::info!(order_id, rider_id, "Rider declined offer");
        self.start_next_locked(order_id, &cell, &mut guard);
        Ok(guard.order.clone())
    }

    // ========================================================================
    // Cancellation support
    // ========================================================================

    /// Resolve a pending offer as `Superseded` and disarm its timer.
    /// Called by the cancellation path while it holds the cell lock, before
    /// the order status flips, so a late timeout cannot restart dispatch.
    pub fn supersede_pending(guard: &mut OrderCell) -> bool {
        let Some(offer) = guard.dispatch.pending_offer_mut() else {
            return false;
        };
        offer.state = OfferState::Superseded;
        guard.dispatch.cancel_timer();
        true
    }
}
