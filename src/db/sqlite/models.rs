//! SQLite database models

use serde::{Deserialize, Serialize};

/// Reject ledger row, as read back for audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectLogEntry {
    pub id: i64,
    pub batch_id: String,
    pub symbol: Option<String>,
    pub datetime: Option<String>,
    pub original_payload: serde_json::Value,
    pub reject_reason: String,
    pub rejected_at: String,
}

/// Reject ledger row to be written
#[derive(Debug, Clone)]
pub struct NewReject {
    pub symbol: Option<String>,
    pub datetime: Option<String>,
    pub original_payload: String,
    pub reject_reason: String,
}

/// Row count and time range for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolStats {
    pub symbol: String,
    pub rows: i64,
    pub first_datetime: String,
    pub last_datetime: String,
}

/// Aggregate statistics over the feature table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub total_rows: i64,
    pub distinct_symbols: i64,
    pub min_datetime: Option<String>,
    pub max_datetime: Option<String>,
    pub symbols: Vec<SymbolStats>,
}
