//! Error types for the quintil toolkit.
//!
//! Configuration and validation failures abort a run immediately. Data gaps
//! (a ticker without prices or fundamentals on some date) are not errors:
//! they are absorbed by the loader and the return engine and only logged.

use thiserror::Error;

/// The main error type for quintil operations.
#[derive(Debug, Error)]
pub enum QuintilError {
    /// Unknown index or cadence identifier, or an unusable data layout.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Metric not supported, or not present in the source data.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from a source frame.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error when a date is out of range or cannot be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error reading source files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl QuintilError {
    /// Whether this error is a fail-fast configuration or validation error.
    #[must_use]
    pub const fn is_fail_fast(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Validation(_))
    }
}

impl From<String> for QuintilError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for QuintilError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for quintil operations.
pub type Result<T> = std::result::Result<T, QuintilError>;
