//! Shared types for the Order & Dispatch Engine
//!
//! Common types used across the workspace: the order aggregate and its
//! lifecycle vocabulary, dispatch offers, domain events, and the typed
//! error taxonomy. This crate is pure data plus serde - no async, no I/O.

pub mod dispatch;
pub mod error;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use dispatch::{DispatchOffer, OfferState, RiderAvailability};
pub use error::{EngineError, EngineResult};
pub use order::{
    Actor, EventPayload, Order, OrderEvent, OrderEventType, OrderItem, OrderStatus,
    RestaurantAction, RiderAction, RiderResponse, TransitionAction,
};
