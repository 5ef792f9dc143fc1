//! Bursar API Server
//!
//! Main entry point for the school finance ledger service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bursar_api::{AppState, create_router};
use bursar_db::connect;
use bursar_shared::{AppConfig, ConfigHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bursar=debug,bursar_db=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        amount_tolerance = %config.reconciliation.amount_tolerance(),
        date_tolerance_days = config.reconciliation.date_tolerance_days,
        posting_policy = ?config.approval.posting_policy,
        "Configuration loaded"
    );

    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: ConfigHandle::new(config),
    };
    let app = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
