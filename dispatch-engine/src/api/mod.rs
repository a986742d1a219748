//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness probe
//! - [`orders`] - order lifecycle and dispatch control
//! - [`riders`] - rider availability book

pub mod health;
pub mod orders;
pub mod riders;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(riders::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
