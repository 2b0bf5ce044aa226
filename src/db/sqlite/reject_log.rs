//! Reject ledger: append-only audit trail of rows refused during ingestion

use super::models::{NewReject, RejectLogEntry};
use rusqlite::{params, Connection};

/// Append all rejects of one batch atomically
pub fn insert_batch(conn: &mut Connection, batch_id: &str, rejects: &[NewReject]) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO reject_log (batch_id, symbol, datetime, original_payload, reject_reason)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for reject in rejects {
            stmt.execute(params![
                batch_id,
                reject.symbol,
                reject.datetime,
                reject.original_payload,
                reject.reject_reason,
            ])?;
        }
    }
    tx.commit()?;

    tracing::debug!("Recorded {} rejects under {}", rejects.len(), batch_id);
    Ok(rejects.len())
}

/// Most recent ledger rows, optionally restricted to one batch
pub fn list(conn: &Connection, batch_id: Option<&str>, limit: i64) -> rusqlite::Result<Vec<RejectLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, batch_id, symbol, datetime, original_payload, reject_reason, rejected_at
         FROM reject_log
         WHERE (?1 IS NULL OR batch_id = ?1)
         ORDER BY id DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![batch_id, limit], |row| {
        let payload: String = row.get(4)?;
        Ok(RejectLogEntry {
            id: row.get(0)?,
            batch_id: row.get(1)?,
            symbol: row.get(2)?,
            datetime: row.get(3)?,
            original_payload: serde_json::from_str(&payload)
                .unwrap_or(serde_json::Value::String(payload)),
            reject_reason: row.get(5)?,
            rejected_at: row.get(6)?,
        })
    })?;

    rows.collect()
}

/// Number of ledger rows recorded for a batch
pub fn count_for_batch(conn: &Connection, batch_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM reject_log WHERE batch_id = ?1",
        params![batch_id],
        |row| row.get(0),
    )
}
