use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};

use recap::api::{self, AppState};
use recap::core::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    recap::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        anyhow::anyhow!("configuration error: {e}")
    })?;

    let port = config.port;
    let state = Arc::new(AppState::from_config(config)?);
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("recap relay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown handler: {}", e);
    }
    info!("Shutdown signal received");
}
