use scoreboard_gateway::config::AppConfig;
use scoreboard_gateway::router::create_router;
use scoreboard_gateway::state::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(environment = %config.environment, "Starting scoreboard gateway");

    if config.is_production() && config.uses_default_keys() {
        tracing::warn!("Default API keys are in use in production; set API_KEYS");
    }

    let addr = config.bind_addr();
    let state = AppState::new(config);
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
