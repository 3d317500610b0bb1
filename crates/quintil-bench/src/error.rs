//! Error types for the benchmark client.

use thiserror::Error;

/// Errors that can occur when fetching benchmark data.
#[derive(Debug, Error)]
pub enum BenchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Failed to parse chart response: {0}")]
    Json(#[from] serde_json::Error),

    /// The chart API returned an error.
    #[error("Chart API error: {0}")]
    Api(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded by the chart API")]
    RateLimitExceeded,

    /// No prices in the requested range.
    #[error("No data available for {0}")]
    NoData(String),
}
