//! Dispatch layer
//!
//! - **queue**: time-boxed, single-flight rider offers per order
//! - **dispatcher**: event-driven orchestration of dispatch cycles
//! - **riders**: availability records and the ranking seam

pub mod dispatcher;
pub mod queue;
pub mod riders;

pub use dispatcher::Dispatcher;
pub use queue::DispatchQueue;
pub use riders::{RiderPool, RiderRegistry, StaticRiderPool};
