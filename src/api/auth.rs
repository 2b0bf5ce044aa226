//! API key authentication
//!
//! Every route except `/health` sits behind this middleware. Keys are compared
//! through their SHA-256 digests with a branch-free fold.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Header carrying the client credential
pub const API_KEY_HEADER: &str = "x-api-key";

const AUTH_FAILED: &str = "Invalid or missing API Key";

/// Whether `provided` matches the configured key. An empty configured key
/// matches nothing.
pub fn key_matches(expected: &str, provided: Option<&str>) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    let mut hasher = Sha256::new();
    hasher.update(expected.as_bytes());
    let expected_digest = hasher.finalize();
    let provided_digest = Sha256::digest(provided.as_bytes());

    expected_digest
        .iter()
        .zip(provided_digest.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Reject requests without a valid `X-API-Key` header
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if !key_matches(&state.config.api_key, provided) {
        warn!(
            "Rejected {} {}: {}",
            request.method(),
            request.uri().path(),
            if provided.is_some() { "invalid API key" } else { "missing API key" }
        );
        return AppError::Auth(AUTH_FAILED.to_string()).into_response();
    }

    next.run(request).await
}
