//! SQLite database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    run_migration(conn, "001_model_features", CREATE_MODEL_FEATURES_TABLE)?;
    run_migration(conn, "002_market_data", CREATE_MARKET_DATA_TABLE)?;
    run_migration(conn, "003_reject_log", CREATE_REJECT_LOG_TABLE)?;

    tracing::info!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    // Check if migration already applied
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_MODEL_FEATURES_TABLE: &str = r#"
CREATE TABLE model_features (
    symbol TEXT NOT NULL,
    datetime TEXT NOT NULL,
    price REAL,
    market_cap REAL,
    beta REAL,
    last_dividend REAL,
    "range" TEXT,
    change REAL,
    change_percentage REAL,
    volume INTEGER CHECK (volume IS NULL OR volume >= 0),
    average_volume INTEGER CHECK (average_volume IS NULL OR average_volume >= 0),
    company_name TEXT,
    currency TEXT,
    cik TEXT,
    isin TEXT,
    cusip TEXT,
    exchange_full_name TEXT,
    exchange TEXT,
    industry TEXT,
    website TEXT,
    description TEXT,
    ceo TEXT,
    sector TEXT,
    country TEXT,
    full_time_employees TEXT,
    phone TEXT,
    address TEXT,
    city TEXT,
    state TEXT,
    zip TEXT,
    image TEXT,
    ipo_date TEXT,
    default_image INTEGER,
    is_etf INTEGER,
    is_actively_trading INTEGER,
    is_adr INTEGER,
    is_fund INTEGER,
    ingested_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (symbol, datetime)
);
CREATE INDEX IF NOT EXISTS idx_model_features_datetime ON model_features(datetime);
"#;

const CREATE_MARKET_DATA_TABLE: &str = r#"
CREATE TABLE market_data (
    symbol TEXT NOT NULL,
    ts TEXT NOT NULL,
    open REAL NOT NULL,
    high REAL NOT NULL,
    low REAL NOT NULL,
    close REAL NOT NULL,
    volume INTEGER NOT NULL CHECK (volume >= 0),
    vwap REAL NOT NULL,
    ingested_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (high >= low),
    UNIQUE (symbol, ts)
);
"#;

const CREATE_REJECT_LOG_TABLE: &str = r#"
CREATE TABLE reject_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id TEXT NOT NULL,
    symbol TEXT,
    datetime TEXT,
    original_payload TEXT NOT NULL,
    reject_reason TEXT NOT NULL,
    rejected_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_reject_log_batch ON reject_log(batch_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FieldKind, RecordSchema, FEATURES, MARKET_DATA};

    fn table_columns(conn: &Connection, table: &str) -> Vec<(String, String)> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", table))
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }

    fn assert_matches_catalog(conn: &Connection, schema: &RecordSchema) {
        let columns = table_columns(conn, schema.table);
        for field in schema.fields {
            let (_, sql_type) = columns
                .iter()
                .find(|(name, _)| name == field.name)
                .unwrap_or_else(|| panic!("{}.{} missing", schema.table, field.name));
            assert_eq!(sql_type, field.kind.sql_type(), "{}.{}", schema.table, field.name);
        }
    }

    #[test]
    fn test_tables_match_catalog() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert_matches_catalog(&conn, &FEATURES);
        assert_matches_catalog(&conn, &MARKET_DATA);
        assert_eq!(FieldKind::Boolean.sql_type(), "INTEGER");
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 3);
    }
}
