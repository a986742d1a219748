//! Rider API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::EngineError;
use shared::dispatch::RiderAvailability;

use crate::core::ServerState;
use crate::utils::{AppResponse, AppResult, ok};

/// Upsert rider request
#[derive(Debug, Deserialize)]
pub struct UpsertRiderRequest {
    pub online: bool,
    pub capacity: u32,
    #[serde(default)]
    pub current_load: u32,
}

/// Insert or replace a rider's availability record
pub async fn upsert(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpsertRiderRequest>,
) -> AppResult<Json<AppResponse<RiderAvailability>>> {
    let record = RiderAvailability {
        rider_id: id,
        online: payload.online,
        capacity: payload.capacity,
        current_load: payload.current_load,
    };
    state.riders.upsert(record.clone());
    Ok(ok(record))
}

/// Get a rider's availability record
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<RiderAvailability>>> {
    let record = state
        .riders
        .get(&id)
        .ok_or_else(|| EngineError::NotFound(format!("rider {}", id)))?;
    Ok(ok(record))
}

/// Online status request
#[derive(Debug, Deserialize)]
pub struct SetOnlineRequest {
    pub online: bool,
}

/// Flip a rider online or offline
pub async fn set_online(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<SetOnlineRequest>,
) -> AppResult<Json<AppResponse<RiderAvailability>>> {
    if !state.riders.set_online(&id, payload.online) {
        return Err(EngineError::NotFound(format!("rider {}", id)).into());
    }
    let record = state
        .riders
        .get(&id)
        .ok_or_else(|| EngineError::NotFound(format!("rider {}", id)))?;
    Ok(ok(record))
}
