use std::collections::HashSet;

use shared::order::OrderStatus;

/// Engine policy knobs. Everything else the engine holds is keyed by
/// order id; this is the only order-independent state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time a rider has to accept a dispatch offer (milliseconds)
    pub offer_ttl_ms: i64,
    /// Max candidates consumed per dispatch cycle
    pub max_dispatch_candidates: usize,
    /// Statuses a customer or restaurant may cancel from. The lifecycle
    /// graph caps this at `Placed | Accepted | Preparing`; anything past
    /// `ReadyForPickup` needs a compensating flow the engine does not own.
    pub cancellable_statuses: HashSet<OrderStatus>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            offer_ttl_ms: 60_000,
            max_dispatch_candidates: 5,
            cancellable_statuses: HashSet::from([
                OrderStatus::Placed,
                OrderStatus::Accepted,
                OrderStatus::Preparing,
            ]),
        }
    }
}

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 3000 | HTTP API port |
/// | OFFER_TTL_SECONDS | 60 | rider offer time-to-live |
/// | MAX_DISPATCH_CANDIDATES | 5 | candidates per dispatch cycle |
/// | CANCELLABLE_STATUSES | PLACED,ACCEPTED,PREPARING | comma-separated |
/// | LOG_LEVEL | info | tracing level |
/// | LOG_DIR | (unset) | daily-rolling log file directory |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | graceful shutdown budget |
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// Engine policy
    pub engine: EngineConfig,
    /// Log level: trace | debug | info | warn | error
    pub log_level: String,
    /// Optional directory for rolling log files
    pub log_dir: Option<String>,
    /// Graceful shutdown budget (milliseconds)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            offer_ttl_ms: std::env::var("OFFER_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .map(|secs| secs * 1_000)
                .unwrap_or(defaults.offer_ttl_ms),
            max_dispatch_candidates: std::env::var("MAX_DISPATCH_CANDIDATES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_dispatch_candidates),
            cancellable_statuses: std::env::var("CANCELLABLE_STATUSES")
                .ok()
                .and_then(|v| parse_statuses(&v))
                .unwrap_or(defaults.cancellable_statuses),
        };

        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            engine,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Override the knobs tests care about
    pub fn with_overrides(http_port: u16, offer_ttl_ms: i64) -> Self {
        let mut config = Self::from_env();
        config.http_port = http_port;
        config.engine.offer_ttl_ms = offer_ttl_ms;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parse a comma-separated status list; `None` if any entry is unknown
fn parse_statuses(raw: &str) -> Option<HashSet<OrderStatus>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| serde_json::from_value(serde_json::Value::String(s.to_string())).ok())
        .collect()
}
