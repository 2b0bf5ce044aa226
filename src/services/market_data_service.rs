//! Market Data Service
//!
//! Single-item ingestion of OHLCV bars. Unlike the feature batch path, every
//! outcome other than an insert is surfaced as an error of the whole call.

use crate::db::sqlite::records::{insert_ignoring_conflict, is_constraint_violation};
use crate::db::SqliteDb;
use crate::error::{AppError, Result};
use crate::records::validation::validate;
use crate::records::{format_instant, MarketDataItem, Record};
use serde_json::Value;
use tracing::{error, info, warn};

const CONSTRAINT_MESSAGE: &str = "Data validation failed - check required fields and formats";

/// Market data service for business logic
pub struct MarketDataService;

impl MarketDataService {
    /// Validate and store one market data item
    pub fn ingest(db: &SqliteDb, raw: &Value) -> Result<MarketDataItem> {
        let item: MarketDataItem = validate(raw).map_err(|e| AppError::Validation(e.message))?;

        let conn = db.session()?;
        match insert_ignoring_conflict(&conn, &item) {
            Ok(true) => {
                info!(
                    "Market data stored: {} @ {}",
                    item.symbol(),
                    format_instant(&item.instant())
                );
                Ok(item)
            }
            Ok(false) => Err(AppError::Conflict(format!(
                "Market data for {} at {} already exists",
                item.symbol,
                format_instant(&item.ts)
            ))),
            Err(e) if is_constraint_violation(&e) => {
                warn!("Market data rejected by constraint for {}: {}", item.symbol, e);
                Err(AppError::Validation(CONSTRAINT_MESSAGE.to_string()))
            }
            Err(e) => {
                error!("Market data insert failed for {}: {}", item.symbol, e);
                Err(AppError::Database(e))
            }
        }
    }
}
