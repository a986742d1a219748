//! Order events - immutable facts published after each committed change
//!
//! Events for a given order are published in the same order they were
//! committed to the Order Store; the global `sequence` is the
//! authoritative total order across all orders.

use serde::{Deserialize, Serialize};

use crate::util;

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and audit)
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Engine timestamp (Unix milliseconds, from the injected clock)
    pub timestamp: i64,
    /// Event type
    pub event_type: OrderEventType,
    /// Event payload
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    // Lifecycle
    OrderCreated,
    OrderAccepted,
    OrderReadyForPickup,
    OrderPickedUp,
    OrderOnTheWay,
    OrderDelivered,
    OrderCancelled,

    // Dispatch
    RiderOffered,
    RiderAssigned,
    DispatchExhausted,
    NeedsManualDispatch,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderEventType::OrderCreated => "ORDER_CREATED",
            OrderEventType::OrderAccepted => "ORDER_ACCEPTED",
            OrderEventType::OrderReadyForPickup => "ORDER_READY_FOR_PICKUP",
            OrderEventType::OrderPickedUp => "ORDER_PICKED_UP",
            OrderEventType::OrderOnTheWay => "ORDER_ON_THE_WAY",
            OrderEventType::OrderDelivered => "ORDER_DELIVERED",
            OrderEventType::OrderCancelled => "ORDER_CANCELLED",
            OrderEventType::RiderOffered => "RIDER_OFFERED",
            OrderEventType::RiderAssigned => "RIDER_ASSIGNED",
            OrderEventType::DispatchExhausted => "DISPATCH_EXHAUSTED",
            OrderEventType::NeedsManualDispatch => "NEEDS_MANUAL_DISPATCH",
        };
        write!(f, "{}", s)
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    OrderCreated {
        customer_id: String,
        restaurant_id: String,
        total_cents: i64,
        item_count: usize,
    },

    OrderAccepted {},

    OrderReadyForPickup {},

    OrderPickedUp {
        rider_id: String,
    },

    OrderOnTheWay {
        rider_id: String,
    },

    OrderDelivered {
        rider_id: String,
    },

    OrderCancelled {
        actor_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Dispatch ==========
    RiderOffered {
        rider_id: String,
        /// Offer deadline (Unix millis); the rider must accept before this
        expires_at: i64,
    },

    RiderAssigned {
        rider_id: String,
    },

    DispatchExhausted {
        /// Offers made during this dispatch cycle
        offers_made: usize,
    },

    NeedsManualDispatch {},
}

impl EventPayload {
    pub fn event_type(&self) -> OrderEventType {
        match self {
            EventPayload::OrderCreated { .. } => OrderEventType::OrderCreated,
            EventPayload::OrderAccepted {} => OrderEventType::OrderAccepted,
            EventPayload::OrderReadyForPickup {} => OrderEventType::OrderReadyForPickup,
            EventPayload::OrderPickedUp { .. } => OrderEventType::OrderPickedUp,
            EventPayload::OrderOnTheWay { .. } => OrderEventType::OrderOnTheWay,
            EventPayload::OrderDelivered { .. } => OrderEventType::OrderDelivered,
            EventPayload::OrderCancelled { .. } => OrderEventType::OrderCancelled,
            EventPayload::RiderOffered { .. } => OrderEventType::RiderOffered,
            EventPayload::RiderAssigned { .. } => OrderEventType::RiderAssigned,
            EventPayload::DispatchExhausted { .. } => OrderEventType::DispatchExhausted,
            EventPayload::NeedsManualDispatch {} => OrderEventType::NeedsManualDispatch,
        }
    }
}

impl OrderEvent {
    /// Create a new event; the type is derived from the payload
    pub fn new(sequence: u64, order_id: String, timestamp: i64, payload: EventPayload) -> Self {
        Self {
            event_id: util::new_id(),
            sequence,
            order_id,
            timestamp,
            event_type: payload.event_type(),
            payload,
        }
    }
}
