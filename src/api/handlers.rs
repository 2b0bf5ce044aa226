//! REST API endpoint handlers
//!
//! Handlers only unpack requests and pick a response shape. SQLite work runs on
//! the blocking pool through the services layer.

use crate::api::types::*;
use crate::error::{AppError, Result};
use crate::services::extraction_service::{csv_filename, ExtractFormat, ExtractParams, Extraction};
use crate::services::{
    BatchOutcome, ExtractionService, IngestionService, MarketDataService, SchemaDescription,
    SchemaService, StatsService,
};
use crate::db::sqlite::models::FeatureStats;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

const DEFAULT_REJECTS_LIMIT: i64 = 100;

/// Run store work off the async executor
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(e.body_text()))
}

fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::Validation(e.body_text()))
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint - GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        message: "DW Feature API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Credential check - POST /v1/test-load
pub async fn test_load() -> impl IntoResponse {
    Json(ApiResponse::<Empty>::success_with_message(
        "Test load endpoint reached - API key verified",
    ))
}

// ============================================================================
// Ingestion
// ============================================================================

/// Batch feature load - POST /v1/load/features
///
/// The body must be a JSON array. Each element is validated on its own, so a
/// malformed element becomes a reject instead of failing the request.
pub async fn load_features(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Json<BatchOutcome>> {
    let batch = json_body(payload)?;
    info!("Received feature batch of {} records", batch.len());

    let db = state.db.clone();
    let max_batch_size = state.config.max_batch_size;
    let outcome =
        run_blocking(move || IngestionService::load_features(&db, &batch, max_batch_size)).await?;

    Ok(Json(outcome))
}

/// Single market data item - POST /ingest/market-data/
pub async fn ingest_market_data(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<Empty>>> {
    let raw = json_body(payload)?;

    let db = state.db.clone();
    run_blocking(move || MarketDataService::ingest(&db, &raw)).await?;

    Ok(Json(ApiResponse::success()))
}

// ============================================================================
// Catalog and Stats
// ============================================================================

/// Field catalog - GET /v1/schema
pub async fn get_schema() -> Json<ApiResponse<SchemaDescription>> {
    Json(ApiResponse::success_with_data(SchemaService::describe()))
}

/// Table statistics - GET /v1/stats?symbols=AAPL,MSFT
pub async fn get_stats(
    State(state): State<AppState>,
    query: std::result::Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<FeatureStats>>> {
    let params = query_params(query)?;

    let db = state.db.clone();
    let stats =
        run_blocking(move || StatsService::feature_stats(&db, params.symbols.as_deref())).await?;

    Ok(Json(ApiResponse::success_with_data(stats)))
}

// ============================================================================
// Extraction
// ============================================================================

fn csv_response(extraction: &Extraction) -> Result<Response> {
    let body = extraction.to_csv()?;
    let disposition = format!("attachment; filename=\"{}\"", csv_filename(Utc::now()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Filtered extraction - GET /v1/extract/features
pub async fn extract_features(
    State(state): State<AppState>,
    query: std::result::Result<Query<ExtractParams>, QueryRejection>,
) -> Result<Response> {
    let params = query_params(query)?;

    let db = state.db.clone();
    let limits = state.config.extraction_limits();
    run_blocking(move || {
        let extraction = ExtractionService::extract(&db, &params, limits)?;
        info!(
            "Extracted {} rows ({} fields, offset {})",
            extraction.rows.len(),
            extraction.query.columns.len(),
            extraction.query.offset
        );
        match extraction.query.format {
            ExtractFormat::Json => Ok(Json(extraction.to_json()).into_response()),
            ExtractFormat::Csv => csv_response(&extraction),
        }
    })
    .await
}

// ============================================================================
// Reject Ledger
// ============================================================================

/// Reject ledger rows - GET /v1/rejects?batch_id=...&limit=...
pub async fn get_rejects(
    State(state): State<AppState>,
    query: std::result::Result<Query<RejectsQuery>, QueryRejection>,
) -> Result<Json<RejectsResponse>> {
    let params = query_params(query)?;

    let limit = match params.limit.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_REJECTS_LIMIT,
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|l| *l >= 1)
            .ok_or_else(|| AppError::Validation(format!("limit must be a positive integer, got '{}'", raw)))?,
    }
    .min(state.config.max_extract_limit);

    let batch_id = params
        .batch_id
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    let db = state.db.clone();
    let rejects = run_blocking(move || db.get_rejects(batch_id.as_deref(), limit)).await?;

    Ok(Json(RejectsResponse {
        status: "success",
        count: rejects.len(),
        rejects,
    }))
}
