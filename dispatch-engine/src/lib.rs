//! Dispatch Engine - order lifecycle and rider dispatch for delivery
//!
//! # Architecture overview
//!
//! The engine keeps every order in an in-memory store, moves it through a
//! strict lifecycle state machine, and hands ready orders to a time-boxed
//! rider offer cycle. All state changes publish events on an in-process
//! broadcast bus; the dispatcher and the rider load tracker are bus
//! subscribers.
//!
//! # Module structure
//!
//! ```text
//! dispatch-engine/src/
//! ├── core/          # Configuration, server shell, shared state
//! ├── api/           # HTTP routes and handlers
//! ├── engine.rs      # OrderEngine, the call surface
//! ├── orders/        # State machine and order store
//! ├── dispatch/      # Offer queue, dispatcher, rider registry
//! ├── bus.rs         # Broadcast event bus with a global sequence
//! ├── clock.rs       # Clock seam for deterministic timer tests
//! └── utils/         # Error envelope, logging
//! ```

pub mod api;
pub mod bus;
pub mod clock;
pub mod core;
pub mod dispatch;
pub mod engine;
pub mod orders;
pub mod utils;

// Re-export the types most callers need
pub use bus::EventBus;
pub use clock::{Clock, ManualClock, SystemClock};
pub use core::{Config, EngineConfig, Server, ServerState};
pub use dispatch::{Dispatcher, RiderPool, RiderRegistry, StaticRiderPool};
pub use engine::OrderEngine;
pub use orders::OrderStore;
pub use utils::{AppError, AppResult};
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load .env and initialize logging from `LOG_LEVEL` / `LOG_DIR`
pub fn setup_environment() {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}
