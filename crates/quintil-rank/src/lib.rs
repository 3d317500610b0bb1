//! Metric registry and quintile ranking for quintil.
//!
//! This crate provides:
//! - Metrics: the allow-list of financial ratios that can be ranked on,
//!   with descriptions and categories
//! - Ranker: partitions index members into a non-positive bucket and five
//!   equal-frequency quintiles on one metric
//!
//! # Example
//!
//! ```ignore
//! use quintil_rank::{Metric, Ranker};
//! use quintil_traits::Bucket;
//!
//! let ranking = Ranker::new(&market).rank(date, "nasdaq100", Metric::Bm)?;
//! let top = ranking.tickers(Bucket::Q5);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod metric;
pub mod ranker;

// Re-export key types
pub use metric::{
    Metric, MetricCategory, MetricInfo, available_metrics, get_metric_info, metrics_by_category,
};
pub use ranker::{QUINTILE_COUNT, RankedTicker, Ranker, Ranking, partition};
