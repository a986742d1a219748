//! Dispatch offer types
//!
//! A dispatch offer is the time-boxed proposal of one order to one rider.
//! Offers are append-only: once resolved they are never mutated again and
//! remain queryable as the per-order audit trail. At most one offer per
//! order is `Pending` at any instant (single-flight).

use serde::{Deserialize, Serialize};

use crate::util;

/// Offer resolution state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferState {
    /// Awaiting the rider's response, expiry timer armed
    Pending,
    /// Rider accepted before the deadline
    Accepted,
    /// Rider declined
    Declined,
    /// Deadline passed without a response
    Expired,
    /// Order was cancelled while the offer was pending
    Superseded,
}

impl OfferState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, OfferState::Pending)
    }
}

/// A time-boxed offer of one order to one rider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOffer {
    /// Offer unique ID
    pub offer_id: String,
    /// Order being offered
    pub order_id: String,
    /// Rider the offer is addressed to
    pub rider_id: String,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Deadline (Unix millis); acceptance at or after this instant fails
    pub expires_at: i64,
    /// Resolution state
    pub state: OfferState,
}

impl DispatchOffer {
    pub fn new(order_id: String, rider_id: String, created_at: i64, expires_at: i64) -> Self {
        Self {
            offer_id: util::new_id(),
            order_id,
            rider_id,
            created_at,
            expires_at,
            state: OfferState::Pending,
        }
    }

    /// Time-based expiry check - no grace period, even by a millisecond
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Rider availability record - maintained outside the engine core, the
/// dispatcher only reads it when ranking candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderAvailability {
    pub rider_id: String,
    /// Whether the rider is accepting offers
    pub online: bool,
    /// Max concurrent active orders
    pub capacity: u32,
    /// Currently assigned active orders
    pub current_load: u32,
}

impl RiderAvailability {
    /// Eligible to receive a new offer
    pub fn has_capacity(&self) -> bool {
        self.online && self.current_load < self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_has_no_grace_period() {
        let offer = DispatchOffer::new("o".to_string(), "r".to_string(), 0, 60_000);
        assert!(!offer.is_expired(59_999));
        assert!(offer.is_expired(60_000));
        assert!(offer.is_expired(60_001));
    }

    #[test]
    fn test_capacity_check() {
        let mut rider = RiderAvailability {
            rider_id: "r1".to_string(),
            online: true,
            capacity: 2,
            current_load: 1,
        };
        assert!(rider.has_capacity());
        rider.current_load = 2;
        assert!(!rider.has_capacity());
        rider.current_load = 0;
        rider.online = false;
        assert!(!rider.has_capacity());
    }
}
