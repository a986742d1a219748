use dispatch_engine::{Config, Server, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    setup_environment();

    tracing::info!("Order & Dispatch Engine starting...");

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Run the HTTP server (background tasks start with the state)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
