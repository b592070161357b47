use anyhow::Context;
use tracing_subscriber::EnvFilter;

use requisition_gateway::config::config;
use requisition_gateway::{handlers, is_production};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up BACKEND_URL, GATEWAY_PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(!is_production!())
        .init();

    let config = config();
    tracing::info!(
        "Starting requisition gateway in {:?} mode, backend {}{}",
        config.environment,
        config.backend.base_url,
        config.backend.api_prefix
    );

    let app = handlers::app(config)?;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Requisition gateway listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
