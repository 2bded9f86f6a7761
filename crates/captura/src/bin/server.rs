//! Capture pipeline server binary
//!
//! Run with: cargo run -p captura --bin captura-server

use captura::{config::CapturaConfig, server::CapturaServer, storage::database};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "captura=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (TOML file + environment secrets)
    let config = CapturaConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - model: {}", config.model.model);
    tracing::info!("  - extraction API: {}", config.extraction.api_url);
    tracing::info!("  - incoming dir: {}", config.storage.incoming_dir.display());
    tracing::info!(
        "  - destination: {}@{}:{}/{} ({})",
        config.database.user,
        config.database.host,
        config.database.port,
        config.database.dbname,
        database::DESTINATION_TABLE
    );

    if config.extraction.api_key.is_none() {
        tracing::warn!("VISION_AGENT_API_KEY not set; extraction requests will be unauthenticated");
    }
    if config.model.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY not set; table generation will fail");
    }

    let server = CapturaServer::new(config)?;

    tracing::info!("Endpoints (GET, ?filename=): /split /extract /generate /insert");
    server.start().await?;

    Ok(())
}
