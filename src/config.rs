//! Service configuration
//!
//! Built once at startup from flags and environment variables, then passed to
//! the components that need it.

use crate::error::{AppError, Result};
use crate::services::ExtractionLimits;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Feature warehouse ingestion and extraction API
#[derive(Debug, Clone, Parser)]
#[command(name = "dw-feature-api", version)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "DW_BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "DW_DATABASE_PATH", default_value = "data/dw_features.db")]
    pub database_path: PathBuf,

    /// Shared API key expected in the `X-API-Key` header
    #[arg(long, env = "API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Maximum pooled database connections
    #[arg(long, env = "DW_POOL_SIZE", default_value_t = 8)]
    pub pool_size: u32,

    /// How long a request waits for a pooled connection
    #[arg(long, env = "DW_POOL_TIMEOUT_MS", default_value_t = 5000)]
    pub pool_timeout_ms: u64,

    /// Largest accepted feature batch
    #[arg(long, env = "DW_MAX_BATCH_SIZE", default_value_t = 5000)]
    pub max_batch_size: usize,

    /// Extraction page size when `limit` is not given
    #[arg(long, env = "DW_DEFAULT_EXTRACT_LIMIT", default_value_t = 1000)]
    pub default_extract_limit: i64,

    /// Upper bound on the extraction page size
    #[arg(long, env = "DW_MAX_EXTRACT_LIMIT", default_value_t = 10_000)]
    pub max_extract_limit: i64,

    /// Largest accepted request body in bytes
    #[arg(long, env = "DW_MAX_BODY_BYTES", default_value_t = 16 * 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl ServiceConfig {
    /// Check option combinations clap cannot express
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(AppError::Config("pool size must be at least 1".to_string()));
        }
        if self.max_batch_size == 0 {
            return Err(AppError::Config("max batch size must be at least 1".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(AppError::Config("max body size must be at least 1 byte".to_string()));
        }
        if self.default_extract_limit < 1 || self.max_extract_limit < 1 {
            return Err(AppError::Config("extract limits must be at least 1".to_string()));
        }
        if self.default_extract_limit > self.max_extract_limit {
            return Err(AppError::Config(format!(
                "default extract limit {} exceeds the maximum {}",
                self.default_extract_limit, self.max_extract_limit
            )));
        }
        Ok(())
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_timeout_ms)
    }

    pub fn extraction_limits(&self) -> ExtractionLimits {
        ExtractionLimits {
            default_limit: self.default_extract_limit,
            max_limit: self.max_extract_limit,
        }
    }

    /// Defaults with the given API key
    #[cfg(test)]
    pub(crate) fn for_tests(api_key: &str) -> Self {
        let mut config = Self::parse_from(["dw-feature-api"]);
        config.api_key = api_key.to_string();
        config
    }
}
