//! REST API module
//!
//! Provides:
//! - Batch feature ingestion with per-row rejects (/v1/load/features)
//! - Single market data ingestion (/ingest/market-data/)
//! - Schema, stats, extraction and reject ledger reads (/v1/*)
//!
//! All routes except `/health` require the `X-API-Key` header.

mod auth;
pub mod handlers;
mod server;
mod types;


pub use auth::{key_matches, API_KEY_HEADER};
pub use server::{router, ApiServer};
pub use types::{ApiResponse, Empty, HealthResponse, RejectsQuery, RejectsResponse, StatsQuery};
