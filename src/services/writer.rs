//! Conflict-tolerant writer
//!
//! One insert per record, keyed on `(symbol, timestamp)`. Each call is its own
//! unit of work: a failure here never touches rows written earlier.

use crate::db::sqlite::records;
use crate::records::{format_instant, Record};
use crate::services::outcome::RowOutcome;
use rusqlite::Connection;
use tracing::{debug, warn};

/// Write one validated record and classify what happened
pub fn write_record<R: Record>(conn: &Connection, record: &R) -> RowOutcome {
    match records::insert_ignoring_conflict(conn, record) {
        Ok(true) => RowOutcome::Inserted,
        Ok(false) => {
            debug!(
                "Duplicate key {} @ {} in {}",
                record.symbol(),
                format_instant(&record.instant()),
                R::SCHEMA.table
            );
            RowOutcome::DuplicateRejected
        }
        Err(e) => {
            warn!(
                "Insert into {} failed for {} @ {}: {}",
                R::SCHEMA.table,
                record.symbol(),
                format_instant(&record.instant()),
                e
            );
            RowOutcome::StorageError(e.to_string())
        }
    }
}
