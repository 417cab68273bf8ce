use anyhow::Context;
use dotenvy::dotenv;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;

use crmserver::build_router;
use crmserver::core::config::AppConfig;
use crmserver::core::shared::state::AppState;
use crmserver::core::shared::{create_conn, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!("Starting crmserver with {:?}", config.database);

    let pool = create_conn(&config.database).context("Failed to create database pool")?;
    run_migrations(&pool)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid SERVER_HOST/SERVER_PORT")?;

    let state = Arc::new(AppState::new(pool, config));
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {addr}: {e} - is another instance running?");
            return Err(e.into());
        }
    };
    info!("HTTP server listening on {addr}");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
