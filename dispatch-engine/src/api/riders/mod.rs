//! Rider API Module
//!
//! Availability book maintenance. Riders announce themselves, flip
//! online/offline, and the dispatcher ranks them from this data.

mod handler;

use axum::{
    Router,
    routing::{post, put},
};

use crate::core::ServerState;

/// Rider router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/riders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", put(handler::upsert).get(handler::get_by_id))
        .route("/{id}/online", post(handler::set_online))
}
