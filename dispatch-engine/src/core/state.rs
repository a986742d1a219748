use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clock::SystemClock;
use crate::core::Config;
use crate::dispatch::{RiderPool, RiderRegistry};
use crate::engine::OrderEngine;

/// Shared server state handed to every router
#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<OrderEngine>,
    pub riders: Arc<RiderRegistry>,
    /// Fires when the server is shutting down; background tasks stop on it
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Build the engine with the production clock and the in-memory rider
    /// registry, and start the background tasks (dispatcher event loop,
    /// rider load tracker)
    pub fn initialize(config: &Config) -> Self {
        let clock = Arc::new(SystemClock::new());
        let riders = RiderRegistry::new();
        let pool = Arc::clone(&riders) as Arc<dyn RiderPool>;
        let engine = OrderEngine::new(config.engine.clone(), clock, pool);
        let shutdown = CancellationToken::new();

        engine.start(shutdown.clone());
        tokio::spawn(
            Arc::clone(&riders).track(engine.subscribe(), shutdown.clone()),
        );

        Self {
            engine,
            riders,
            shutdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::OrderItem;

    #[tokio::test]
    async fn test_initialize_wires_engine_and_registry() {
        let config = Config::from_env();
        let state = ServerState::initialize(&config);

        let order = state
            .engine
            .create_order(
                "cust-1",
                "rest-1",
                vec![OrderItem {
                    sku: "sku-1".to_string(),
                    quantity: 1,
                    unit_price_cents: 100,
                }],
            )
            .await
            .unwrap();
        assert_eq!(state.engine.get_order(&order.id).await.unwrap().id, order.id);
        assert!(state.riders.get("nobody").is_none());

        state.shutdown.cancel();
    }
}
