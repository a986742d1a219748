//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::dispatch::DispatchOffer;
use shared::order::{Order, OrderItem, RestaurantAction, RiderAction, RiderResponse};

use crate::core::ServerState;
use crate::utils::{AppResponse, AppResult, ok};

/// Create order request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub restaurant_id: String,
    pub items: Vec<OrderItem>,
}

/// Place a new order
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .engine
        .create_order(&payload.customer_id, &payload.restaurant_id, payload.items)
        .await?;
    Ok(ok(order))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.engine.get_order(&id).await?;
    Ok(ok(order))
}

/// Get the offer audit trail for an order
pub async fn offer_history(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<DispatchOffer>>>> {
    let offers = state.engine.offer_history(&id).await?;
    Ok(ok(offers))
}

/// Restaurant transition request
#[derive(Debug, Deserialize)]
pub struct RestaurantTransitionRequest {
    pub action: RestaurantAction,
    pub actor_id: String,
}

/// Apply a restaurant lifecycle action (accept, reject, preparing, ready)
pub async fn restaurant_transition(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RestaurantTransitionRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .engine
        .restaurant_transition(&id, payload.action, &payload.actor_id)
        .await?;
    Ok(ok(order))
}

/// Rider offer response request
#[derive(Debug, Deserialize)]
pub struct RiderRespondRequest {
    pub rider_id: String,
    pub response: RiderResponse,
}

/// Accept or decline the pending dispatch offer
pub async fn rider_respond(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RiderRespondRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .engine
        .rider_respond(&id, &payload.rider_id, payload.response)
        .await?;
    Ok(ok(order))
}

/// Rider delivery progress request
#[derive(Debug, Deserialize)]
pub struct RiderTransitionRequest {
    pub rider_id: String,
    pub action: RiderAction,
}

/// Progress an assigned order (picked up, on the way, delivered)
pub async fn rider_transition(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RiderTransitionRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .engine
        .rider_transition(&id, &payload.rider_id, payload.action)
        .await?;
    Ok(ok(order))
}

/// Cancel request
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub actor_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Cancel an order as its customer or restaurant
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .engine
        .cancel_order(&id, &payload.actor_id, payload.reason)
        .await?;
    Ok(ok(order))
}

/// Re-run the dispatch cycle for an order flagged for manual dispatch
pub async fn redispatch(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    state.engine.redispatch(&id).await?;
    let order = state.engine.get_order(&id).await?;
    Ok(ok(order))
}
