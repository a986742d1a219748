//! Configuration, shared state and the HTTP server shell

pub mod config;
pub mod server;
pub mod state;

pub use config::{Config, EngineConfig};
pub use server::Server;
pub use state::ServerState;
