//! Order lifecycle core
//!
//! - **machine**: pure transition function over the lifecycle graph
//! - **store**: keyed, lockable map of order cells (single writer per order)

pub mod machine;
pub mod store;

pub use store::{DispatchState, OrderCell, OrderStore};
