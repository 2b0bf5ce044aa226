//! Services Layer
//!
//! Business logic shared by the REST handlers and the tests. Services own the
//! unit of work for one request: they check out a pooled connection, run the
//! record pipeline and hand back plain values.
//!
//! # Architecture
//!
//! ```text
//! REST API --> Services --> Validator --> Writer --> SQLite
//!                  │                          │
//!                  └──> Aggregator <──────────┘──> Reject Ledger
//! ```
//!
//! # Services
//!
//! - `IngestionService` - Batch feature loading with partial failure
//! - `MarketDataService` - Single OHLCV item ingestion
//! - `ExtractionService` - Filtered, paginated JSON/CSV reads
//! - `StatsService` - Totals and per-symbol ranges
//! - `SchemaService` - Field catalog description
//! - `RejectLedger` - Audit trail of rejected rows

pub mod extraction_service;
pub mod ingestion_service;
pub mod market_data_service;
pub mod outcome;
pub mod reject_ledger;
pub mod schema_service;
pub mod stats_service;
pub mod writer;

// Re-export commonly used types and services
pub use extraction_service::{ExtractFormat, ExtractParams, Extraction, ExtractionLimits, ExtractionService};
pub use ingestion_service::IngestionService;
pub use market_data_service::MarketDataService;
pub use outcome::{BatchOutcome, BatchStatus, RejectEntry, RejectReason, RowOutcome};
pub use reject_ledger::RejectLedger;
pub use schema_service::{SchemaDescription, SchemaService};
pub use stats_service::StatsService;
