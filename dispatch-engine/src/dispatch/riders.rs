//! Rider availability
//!
//! The engine never ranks riders itself; candidate ordering is a policy
//! decision made behind the [`RiderPool`] seam. [`RiderRegistry`] is the
//! in-process implementation: an availability book the rider app updates,
//! with load tracked from bus events so the registry only ever *reads*
//! order state.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::dispatch::RiderAvailability;
use shared::order::{EventPayload, Order, OrderEvent};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// External rider-ranking collaborator. Returns candidates in offer order.
#[async_trait]
pub trait RiderPool: Send + Sync + 'static {
    async fn candidates(&self, order: &Order) -> Vec<String>;
}

/// Fixed candidate list - test/bootstrap pool
pub struct StaticRiderPool {
    riders: Vec<String>,
}

impl StaticRiderPool {
    pub fn new(riders: Vec<String>) -> Self {
        Self { riders }
    }
}

#[async_trait]
impl RiderPool for StaticRiderPool {
    async fn candidates(&self, _order: &Order) -> Vec<String> {
        self.riders.clone()
    }
}

// ============================================================================
// RiderRegistry
// ============================================================================

/// In-memory availability book.
///
/// Ranking policy: online riders with spare capacity, least-loaded first,
/// rider id as the tie-breaker so ordering is deterministic.
#[derive(Debug, Default)]
pub struct RiderRegistry {
    riders: RwLock<HashMap<String, RiderAvailability>>,
}

impl RiderRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert or replace a rider's availability record
    pub fn upsert(&self, record: RiderAvailability) {
        self.riders.write().insert(record.rider_id.clone(), record);
    }

    /// Flip a rider online/offline. A rider going offline keeps any
    /// pending offer; it simply expires on its own deadline.
    pub fn set_online(&self, rider_id: &str, online: bool) -> bool {
        let mut riders = self.riders.write();
        match riders.get_mut(rider_id) {
            Some(record) => {
                record.online = online;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, rider_id: &str) -> Option<RiderAvailability> {
        self.riders.read().get(rider_id).cloned()
    }

    fn adjust_load(&self, rider_id: &str, delta: i64) {
        let mut riders = self.riders.write();
        if let Some(record) = riders.get_mut(rider_id) {
            let load = i64::from(record.current_load) + delta;
            record.current_load = load.max(0) as u32;
        }
    }

    /// Track assignment load from bus events until shutdown.
    ///
    /// Runs as a background task; lag only costs load accuracy, never
    /// correctness of dispatch itself.
    pub async fn track(self: Arc<Self>, mut rx: broadcast::Receiver<OrderEvent>, shutdown: CancellationToken) {
        tracing::info!("Rider load tracker started");
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Ok(event) => self.observe(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Rider load tracker lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.cancelled() => break,
            }
        }
        tracing::info!("Rider load tracker stopped");
    }

    fn observe(&self, event: &OrderEvent) {
        match &event.payload {
            EventPayload::RiderAssigned { rider_id } => self.adjust_load(rider_id, 1),
            EventPayload::OrderDelivered { rider_id } => self.adjust_load(rider_id, -1),
            _ => {}
        }
    }
}

#[async_trait]
impl RiderPool for RiderRegistry {
    async fn candidates(&self, _order: &Order) -> Vec<String> {
        let riders = self.riders.read();
        let mut eligible: Vec<&RiderAvailability> =
            riders.values().filter(|r| r.has_capacity()).collect();
        eligible.sort_by(|a, b| {
            a.current_load
                .cmp(&b.current_load)
                .then_with(|| a.rider_id.cmp(&b.rider_id))
        });
        eligible.iter().map(|r| r.rider_id.clone()).collect()
    }
}
