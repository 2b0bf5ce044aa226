//! DW Feature API - Market/Feature Record Ingestion Service
//!
//! Accepts batches of financial feature records, validates and deduplicates
//! them against SQLite, keeps an audit ledger of rejected rows and serves the
//! stored data back as filtered JSON or CSV for model training.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod records;
pub mod services;
pub mod state;

use anyhow::Context;
use api::ApiServer;
use config::ServiceConfig;
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging from `RUST_LOG`
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dw_feature_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Open the store and serve the API until shutdown
pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    tracing::info!("Starting DW Feature API...");

    let state = AppState::new(config).context("failed to initialize application state")?;
    tracing::info!("Application state initialized");

    ApiServer::new(state).run().await.context("API server failed")?;
    Ok(())
}
