//! Order aggregate and lifecycle vocabulary
//!
//! One canonical status enum replaces the per-screen status strings the
//! product UIs used to carry. All monetary amounts are integer minor units
//! (cents) - never floating point.

use serde::{Deserialize, Serialize};

use crate::util;

// ============================================================================
// Order Status
// ============================================================================

/// Order status - the canonical lifecycle states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created by the customer, awaiting restaurant action
    #[default]
    Placed,
    /// Accepted by the restaurant
    Accepted,
    /// Kitchen is preparing the order
    Preparing,
    /// Ready for a rider; dispatch runs while in this state
    ReadyForPickup,
    /// A rider accepted the dispatch offer
    RiderAssigned,
    /// Rider collected the order from the restaurant
    PickedUp,
    /// Rider is en route to the customer
    OnTheWay,
    /// Delivered to the customer (terminal)
    Delivered,
    /// Cancelled before dispatch completed (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Terminal states have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// States in which a rider is (or was) responsible for the order
    pub fn has_rider(&self) -> bool {
        matches!(
            self,
            OrderStatus::RiderAssigned
                | OrderStatus::PickedUp
                | OrderStatus::OnTheWay
                | OrderStatus::Delivered
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
            OrderStatus::RiderAssigned => "RIDER_ASSIGNED",
            OrderStatus::PickedUp => "PICKED_UP",
            OrderStatus::OnTheWay => "ON_THE_WAY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Actors and Actions
// ============================================================================

/// Who is attempting a transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    Customer,
    Restaurant,
    Rider,
    Dispatcher,
}

/// Transition requested of the state machine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionAction {
    Accept,
    MarkPreparing,
    MarkReady,
    AssignRider,
    PickUp,
    StartDelivery,
    Deliver,
    Cancel,
}

impl TransitionAction {
    /// The status this action targets, used for `InvalidTransition`
    /// diagnostics
    pub fn target(&self) -> OrderStatus {
        match self {
            TransitionAction::Accept => OrderStatus::Accepted,
            TransitionAction::MarkPreparing => OrderStatus::Preparing,
            TransitionAction::MarkReady => OrderStatus::ReadyForPickup,
            TransitionAction::AssignRider => OrderStatus::RiderAssigned,
            TransitionAction::PickUp => OrderStatus::PickedUp,
            TransitionAction::StartDelivery => OrderStatus::OnTheWay,
            TransitionAction::Deliver => OrderStatus::Delivered,
            TransitionAction::Cancel => OrderStatus::Cancelled,
        }
    }
}

/// Restaurant-facing call surface actions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestaurantAction {
    Accept,
    Reject,
    MarkPreparing,
    MarkReady,
}

/// Rider response to a dispatch offer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiderResponse {
    Accept,
    Decline,
}

/// Rider-facing call surface actions after assignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiderAction {
    PickedUp,
    OnTheWay,
    Delivered,
}

impl RiderAction {
    pub fn transition(&self) -> TransitionAction {
        match self {
            RiderAction::PickedUp => TransitionAction::PickUp,
            RiderAction::OnTheWay => TransitionAction::StartDelivery,
            RiderAction::Delivered => TransitionAction::Deliver,
        }
    }
}

// ============================================================================
// Order Items
// ============================================================================

/// A single order line - immutable after the order is placed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    /// Product SKU
    pub sku: String,
    /// Quantity ordered
    pub quantity: u32,
    /// Unit price in minor units (cents)
    pub unit_price_cents: i64,
}

impl OrderItem {
    /// Line total in minor units
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

// ============================================================================
// Order Aggregate
// ============================================================================

/// Order aggregate - the authoritative record owned by the Order Store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (opaque, unique, immutable)
    pub id: String,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// Restaurant fulfilling the order
    pub restaurant_id: String,
    /// Customer who placed the order
    pub customer_id: String,
    /// Assigned rider - set iff status has reached `RiderAssigned`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider_id: Option<String>,
    /// Order lines (immutable after `Placed`)
    pub items: Vec<OrderItem>,
    /// Derived total in minor units
    pub total_cents: i64,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Timestamp of the last status change (Unix millis)
    pub status_changed_at: i64,
    /// Monotonically incrementing version for optimistic concurrency
    pub version: u64,
}

impl Order {
    /// Create a new order in `Placed` with a derived total
    pub fn new(
        customer_id: impl Into<String>,
        restaurant_id: impl Into<String>,
        items: Vec<OrderItem>,
        now: i64,
    ) -> Self {
        let total_cents = items.iter().map(OrderItem::line_total_cents).sum();
        Self {
            id: util::new_id(),
            status: OrderStatus::Placed,
            restaurant_id: restaurant_id.into(),
            customer_id: customer_id.into(),
            rider_id: None,
            items,
            total_cents,
            created_at: now,
            status_changed_at: now,
            version: 1,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<OrderItem> {
        vec![
            OrderItem {
                sku: "sku-burger".to_string(),
                quantity: 2,
                unit_price_cents: 950,
            },
            OrderItem {
                sku: "sku-fries".to_string(),
                quantity: 1,
                unit_price_cents: 350,
            },
        ]
    }

    #[test]
    fn test_total_is_derived_in_cents() {
        let order = Order::new("cust-1", "rest-1", items(), 1_000);
        assert_eq!(order.total_cents, 2 * 950 + 350);
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.version, 1);
        assert!(order.rider_id.is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::ReadyForPickup.is_terminal());
    }

    #[test]
    fn test_status_serde_screaming_snake() {
        let json = serde_json::to_string(&OrderStatus::ReadyForPickup).unwrap();
        assert_eq!(json, "\"READY_FOR_PICKUP\"");
        let back: OrderStatus = serde_json::from_str("\"ON_THE_WAY\"").unwrap();
        assert_eq!(back, OrderStatus::OnTheWay);
    }
}
