//! Error types for quakeph.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

use crate::client::Query;

/// Errors that can occur talking to the earthquake API.
#[derive(Error, Debug)]
pub enum QuakeError {
    /// HTTP request failed (connect, timeout, body decode)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// API returned a non-success status
    #[error("Failed to fetch {} (HTTP {status})", query.describe())]
    Api { query: Query, status: u16 },

    /// Invalid response structure
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
