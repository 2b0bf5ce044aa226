//! Application state management

use crate::config::ServiceConfig;
use crate::db::SqliteDb;
use crate::error::Result;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub db: Arc<SqliteDb>,

    /// Startup configuration
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!("Database path: {:?}", config.database_path);
        let db = SqliteDb::new(&config.database_path, config.pool_size, config.pool_timeout())?;

        Ok(Self::with_db(config, db))
    }

    /// Wrap an already opened database
    pub fn with_db(config: ServiceConfig, db: SqliteDb) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}
