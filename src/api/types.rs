//! REST API request and response types

use crate::db::sqlite::models::RejectLogEntry;
use serde::{Deserialize, Serialize};

/// Standard response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: None,
        }
    }

    pub fn success_with_message(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.to_string()),
            data: None,
        }
    }

    pub fn success_with_data(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
        }
    }
}

/// Placeholder payload for responses without data
#[derive(Debug, Clone, Serialize)]
pub struct Empty {}

/// Liveness body
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

/// GET /v1/stats query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    pub symbols: Option<String>,
}

/// GET /v1/rejects query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectsQuery {
    pub batch_id: Option<String>,
    pub limit: Option<String>,
}

/// Ledger rows returned by GET /v1/rejects
#[derive(Debug, Clone, Serialize)]
pub struct RejectsResponse {
    pub status: &'static str,
    pub count: usize,
    pub rejects: Vec<RejectLogEntry>,
}
