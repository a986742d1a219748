//! Order API Module
//!
//! The HTTP surface over the order lifecycle: intake, restaurant and
//! rider transitions, cancellation, and dispatch control.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Intake
        .route("/", post(handler::create))
        // Snapshot reads
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/offers", get(handler::offer_history))
        // Restaurant lifecycle actions
        .route("/{id}/restaurant", post(handler::restaurant_transition))
        // Rider offer response and delivery progress
        .route("/{id}/rider/respond", post(handler::rider_respond))
        .route("/{id}/rider/transition", post(handler::rider_transition))
        // Cancellation and manual dispatch
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/redispatch", post(handler::redispatch))
}
