//! Reject Ledger
//!
//! Persists every reject of a batch under one batch id, each with the record
//! exactly as the client sent it.

use crate::db::sqlite::models::NewReject;
use crate::db::sqlite::reject_log;
use crate::services::outcome::RejectEntry;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::Value;
use uuid::Uuid;

/// Batch id from the submission wall clock plus a random suffix, so two
/// batches rejected within the same second never share an id.
pub fn new_batch_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("batch-{}-{}", now.format("%Y%m%d-%H%M%S"), &suffix[..8])
}

/// Reject ledger service
pub struct RejectLedger;

impl RejectLedger {
    /// Record the rejects of one batch. Returns the batch id, or `None` when
    /// there was nothing to record.
    pub fn record(
        conn: &mut Connection,
        rejects: &[RejectEntry],
        batch: &[Value],
        now: DateTime<Utc>,
    ) -> rusqlite::Result<Option<String>> {
        if rejects.is_empty() {
            return Ok(None);
        }

        let rows: Vec<NewReject> = rejects
            .iter()
            .map(|entry| NewReject {
                symbol: entry.symbol.clone(),
                datetime: entry.datetime.clone(),
                original_payload: batch
                    .get(entry.index)
                    .map(Value::to_string)
                    .unwrap_or_else(|| "null".to_string()),
                reject_reason: format!("{}: {}", entry.reason.as_str(), entry.detail),
            })
            .collect();

        let batch_id = new_batch_id(now);
        reject_log::insert_batch(conn, &batch_id, &rows)?;
        Ok(Some(batch_id))
    }
}
