//! SQLite database module

pub mod models;
mod connection;
mod migrations;
pub mod records;
pub mod reject_log;
mod stats;

use crate::error::{AppError, Result};
pub use connection::SqlitePool;
use models::*;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

/// A pooled connection held for the duration of one request
pub type Session = PooledConnection<SqliteConnectionManager>;

/// SQLite database wrapper
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    /// Open (creating if needed) the database at `path` and run migrations
    pub fn new(path: &Path, pool_size: u32, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let pool = connection::build_pool(path, pool_size, timeout)?;
        let db = Self { pool };

        // Run migrations
        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.session()?;
        migrations::run_migrations(&conn)
    }

    /// Check out a connection for one unit of work.
    ///
    /// Failing here means the store is unreachable; nothing has been attempted.
    pub fn session(&self) -> Result<Session> {
        self.pool.get().map_err(|e| {
            tracing::error!("Failed to acquire database connection: {}", e);
            AppError::Pool(e)
        })
    }

    // ========== Stats Methods ==========

    /// Get feature table statistics
    pub fn get_feature_stats(&self, symbols: &[String]) -> Result<FeatureStats> {
        let conn = self.session()?;
        Ok(stats::feature_stats(&conn, symbols)?)
    }

    // ========== Reject Log Methods ==========

    /// Get reject ledger rows
    pub fn get_rejects(&self, batch_id: Option<&str>, limit: i64) -> Result<Vec<RejectLogEntry>> {
        let conn = self.session()?;
        Ok(reject_log::list(&conn, batch_id, limit)?)
    }

    /// Fresh migrated database in a temporary directory
    #[cfg(test)]
    pub(crate) fn temporary() -> (tempfile::TempDir, Self) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Self::new(&dir.path().join("features.db"), 2, Duration::from_secs(2))
            .expect("open temporary database");
        (dir, db)
    }

    /// Database whose pool can never hand out a connection
    #[cfg(test)]
    pub(crate) fn unreachable() -> Self {
        let manager = SqliteConnectionManager::file("/nonexistent-dir/never/features.db");
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_millis(100))
            .build_unchecked(manager);
        Self { pool }
    }
}
