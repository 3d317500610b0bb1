#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quintil/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core definitions for the quintil backtesting toolkit.
//!
//! This crate provides the data model, the error taxonomy and the
//! [`DataSource`] abstraction shared by the loader, ranker and return engine.

/// The version of the quintil-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod source;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{QuintilError, Result};
pub use source::DataSource;
pub use types::{
    Bucket, CE_TO_UNIX_EPOCH_DAYS, Date, MetricsSnapshot, MonthlyRecord, PricePoint, ReturnPoint,
    ReturnSeries, SnapshotRow, Ticker, date_to_epoch_days, epoch_days_to_date, month_start,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
