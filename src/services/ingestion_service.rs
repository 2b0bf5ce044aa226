//! Ingestion Service
//!
//! Batch loading with partial failure: every record is validated and written
//! on its own, outcomes are folded into one response, and rejects are written
//! to the ledger once the whole batch is known.

use crate::db::SqliteDb;
use crate::error::{AppError, Result};
use crate::records::validation::{key_hint, validate};
use crate::records::{FeatureRecord, Record};
use crate::services::outcome::{BatchOutcome, RowOutcome, RowReport};
use crate::services::reject_ledger::RejectLedger;
use crate::services::writer::write_record;
use chrono::Utc;
use rusqlite::Connection;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};

/// Ingestion service for business logic
pub struct IngestionService;

impl IngestionService {
    /// Load a batch of feature records.
    ///
    /// Only an empty/oversized batch or an unreachable store fails the call;
    /// everything else is reported per row in the returned outcome.
    pub fn load_features(db: &SqliteDb, batch: &[Value], max_batch_size: usize) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Err(AppError::Validation("No records provided".to_string()));
        }
        if batch.len() > max_batch_size {
            return Err(AppError::Validation(format!(
                "Batch of {} records exceeds the limit of {}",
                batch.len(),
                max_batch_size
            )));
        }

        let started = Instant::now();
        let mut conn = db.session()?;

        let reports: Vec<RowReport> = batch
            .iter()
            .enumerate()
            .map(|(index, raw)| Self::process_row::<FeatureRecord>(&conn, index, raw))
            .collect();

        let mut outcome = BatchOutcome::aggregate(reports);

        if !outcome.rejects.is_empty() {
            match RejectLedger::record(&mut conn, &outcome.rejects, batch, Utc::now()) {
                Ok(batch_id) => outcome.batch_id = batch_id,
                Err(e) => {
                    warn!(
                        "Reject ledger write failed; {} rejects of this batch were not recorded: {}",
                        outcome.rejects.len(),
                        e
                    );
                    outcome.ledger_error = Some(e.to_string());
                }
            }
        }

        info!(
            "Feature batch processed in {:?}: status={:?} inserted={}/{} rejects={} batch_id={}",
            started.elapsed(),
            outcome.status,
            outcome.inserted_count,
            outcome.total_received,
            outcome.rejects.len(),
            outcome.batch_id.as_deref().unwrap_or("-"),
        );

        Ok(outcome)
    }

    /// Validate and write one record of a batch
    pub fn process_row<R: Record>(conn: &Connection, index: usize, raw: &Value) -> RowReport {
        let (symbol, datetime) = key_hint(raw, R::SCHEMA);
        let outcome = match validate::<R>(raw) {
            Ok(record) => write_record(conn, &record),
            Err(e) => RowOutcome::ValidationError(e.message),
        };

        RowReport {
            index,
            symbol,
            datetime,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::reject_log;
    use crate::services::outcome::{BatchStatus, RejectReason};
    use serde_json::json;

    const MAX: usize = 100;

    #[test]
    fn test_clean_batch_is_success() {
        let (_dir, db) = SqliteDb::temporary();
        let batch = vec![
            json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00", "price": 273.68}),
            json!({"symbol": "MSFT", "datetime": "2026-02-12T16:00:00", "price": 300.50}),
        ];

        let outcome = IngestionService::load_features(&db, &batch, MAX).unwrap();
        assert_eq!(outcome.status, BatchStatus::Success);
        assert_eq!(outcome.inserted_count, 2);
        assert_eq!(outcome.total_received, 2);
        assert!(outcome.rejects.is_empty());
        assert!(outcome.batch_id.is_none());
        assert!(outcome.ledger_error.is_none());
    }

    #[test]
    fn test_same_batch_self_duplicate() {
        let (_dir, db) = SqliteDb::temporary();
        let record = json!({"symbol": "AAPL", "ts": "2026-02-12T16:00:00", "price": 100});
        let batch = vec![record.clone(), record];

        let outcome = IngestionService::load_features(&db, &batch, MAX).unwrap();
        assert_eq!(outcome.status, BatchStatus::Partial);
        assert_eq!(outcome.inserted_count, 1);
        assert_eq!(outcome.rejects.len(), 1);
        assert_eq!(outcome.rejects[0].index, 1);
        assert_eq!(outcome.rejects[0].reason, RejectReason::DuplicateKey);
    }

    #[test]
    fn test_resubmission_is_idempotent() {
        let (_dir, db) = SqliteDb::temporary();
        let batch = vec![json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00", "price": 273.68})];

        let first = IngestionService::load_features(&db, &batch, MAX).unwrap();
        assert_eq!(first.inserted_count, 1);

        let second = IngestionService::load_features(&db, &batch, MAX).unwrap();
        assert_eq!(second.status, BatchStatus::Partial);
        assert_eq!(second.inserted_count, 0);
        assert_eq!(second.rejects[0].reason, RejectReason::DuplicateKey);
        assert!(second.rejects[0].detail.contains("Duplicate key"));

        assert_eq!(db.get_feature_stats(&[]).unwrap().total_rows, 1);
    }

    #[test]
    fn test_failures_are_isolated_and_indexed() {
        let (_dir, db) = SqliteDb::temporary();
        let batch = vec![
            json!({"symbol": "", "datetime": "2026-02-12T16:00:00"}),
            json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00"}),
            json!("not an object"),
            json!({"symbol": "MSFT", "datetime": "2026-02-12T16:00:00", "volume": -10}),
            json!({"symbol": "TSLA", "datetime": "garbage"}),
            json!({"symbol": "NVDA", "datetime": "2026-02-12T16:00:00", "volume": 10}),
        ];

        let outcome = IngestionService::load_features(&db, &batch, MAX).unwrap();
        assert_eq!(outcome.inserted_count, 2);
        assert_eq!(outcome.total_received, 6);

        let summary: Vec<(usize, RejectReason)> =
            outcome.rejects.iter().map(|r| (r.index, r.reason)).collect();
        assert_eq!(
            summary,
            vec![
                (0, RejectReason::ValidationError),
                (2, RejectReason::ValidationError),
                (3, RejectReason::StorageError),
                (4, RejectReason::ValidationError),
            ]
        );
        assert_eq!(outcome.rejects[3].symbol.as_deref(), Some("TSLA"));
        assert_eq!(outcome.rejects[3].datetime.as_deref(), Some("garbage"));
        assert!(outcome.rejects[3].detail.contains("datetime"));

        assert!(outcome.ledger_error.is_none());
        let batch_id = outcome.batch_id.expect("rejects recorded");
        let conn = db.session().unwrap();
        assert_eq!(reject_log::count_for_batch(&conn, &batch_id).unwrap(), 4);
    }

    #[test]
    fn test_out_of_range_year_is_a_validation_reject() {
        let (_dir, db) = SqliteDb::temporary();
        let batch = vec![
            json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00"}),
            json!({"symbol": "AAPL", "datetime": "+12345-01-01T00:00:00"}),
        ];

        let outcome = IngestionService::load_features(&db, &batch, MAX).unwrap();
        assert_eq!(outcome.inserted_count, 1);
        assert_eq!(outcome.rejects.len(), 1);
        assert_eq!(outcome.rejects[0].index, 1);
        assert_eq!(outcome.rejects[0].reason, RejectReason::ValidationError);
    }

    #[test]
    fn test_ledger_failure_keeps_outcome() {
        let (_dir, db) = SqliteDb::temporary();
        db.session().unwrap().execute_batch("DROP TABLE reject_log;").unwrap();

        let batch = vec![
            json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00"}),
            json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00"}),
        ];
        let outcome = IngestionService::load_features(&db, &batch, MAX).unwrap();
        assert_eq!(outcome.status, BatchStatus::Partial);
        assert_eq!(outcome.inserted_count, 1);
        assert_eq!(outcome.rejects.len(), 1);
        assert!(outcome.batch_id.is_none());
        let ledger_error = outcome.ledger_error.expect("ledger failure reported");
        assert!(ledger_error.contains("reject_log"), "{}", ledger_error);
    }

    #[test]
    fn test_client_errors_before_storage() {
        let db = SqliteDb::unreachable();

        let empty = IngestionService::load_features(&db, &[], MAX).unwrap_err();
        assert!(matches!(empty, AppError::Validation(ref m) if m == "No records provided"));

        let big = vec![json!({}); 3];
        let oversized = IngestionService::load_features(&db, &big, 2).unwrap_err();
        assert!(matches!(oversized, AppError::Validation(_)));
    }

    #[test]
    fn test_unreachable_store_fails_whole_batch() {
        let db = SqliteDb::unreachable();
        let batch = vec![json!({"symbol": "AAPL", "datetime": "2026-02-12T16:00:00"})];
        let err = IngestionService::load_features(&db, &batch, MAX).unwrap_err();
        assert!(matches!(err, AppError::Pool(_)));
    }
}
