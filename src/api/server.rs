//! HTTP server for the ingestion and extraction API
//!
//! Provides:
//! - Liveness (/health), open to everyone
//! - Feature batch and market data ingestion
//! - Schema, stats, extraction and reject ledger reads

use crate::api::auth::require_api_key;
use crate::api::handlers;
use crate::error::Result;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Build the router with all routes
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    let protected = Router::new()
        // ================================================================
        // Ingestion
        // ================================================================
        .route("/v1/test-load", post(handlers::test_load))
        .route("/v1/load/features", post(handlers::load_features))
        .route("/ingest/market-data/", post(handlers::ingest_market_data))
        // ================================================================
        // Reads
        // ================================================================
        .route("/v1/schema", get(handlers::get_schema))
        .route("/v1/stats", get(handlers::get_stats))
        .route("/v1/extract/features", get(handlers::extract_features))
        .route("/v1/rejects", get(handlers::get_rejects))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(protected)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind and serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind;
        if self.state.config.api_key.is_empty() {
            warn!("API_KEY is not configured; every authenticated endpoint will answer 401");
        }

        let app = router(self.state.clone());

        info!("Starting DW Feature API server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;

        log_endpoints(&addr.to_string());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("API server shutting down"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn log_endpoints(base: &str) {
    info!("");
    info!("=== Endpoints ===");
    info!("");
    info!("Health Check:");
    info!("  GET  http://{}/health", base);
    info!("");
    info!("Ingestion (X-API-Key required):");
    info!("  POST http://{}/v1/test-load", base);
    info!("  POST http://{}/v1/load/features", base);
    info!("  POST http://{}/ingest/market-data/", base);
    info!("");
    info!("Reads (X-API-Key required):");
    info!("  GET  http://{}/v1/schema", base);
    info!("  GET  http://{}/v1/stats?symbols=", base);
    info!("  GET  http://{}/v1/extract/features?symbols=&start=&end=&fields=&limit=&offset=&format=json|csv", base);
    info!("  GET  http://{}/v1/rejects?batch_id=&limit=", base);
}
