//! Order domain types
//!
//! - **types**: the order aggregate, items, status enum and actor/action
//!   vocabulary
//! - **event**: immutable domain events fanned out by the engine

pub mod event;
pub mod types;

pub use event::{EventPayload, OrderEvent, OrderEventType};
pub use types::{
    Actor, Order, OrderItem, OrderStatus, RestaurantAction, RiderAction, RiderResponse,
    TransitionAction,
};
