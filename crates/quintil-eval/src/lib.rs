//! Backtesting and return analysis for quintil.
//!
//! This crate turns quintile rankings into portfolio returns:
//! - Return engine: equal-weighted daily or cap-weighted monthly returns
//!   over a holding window
//! - Rebalancer: periodic re-ranking with per-bucket cumulative series and
//!   period statistics
//! - Analysis: CAGR, year × portfolio tables, resampling and growth curves
//! - Regression: holding-period return against a metric, with outlier removal
//!
//! # Example
//!
//! ```rust,ignore
//! use quintil_eval::{PortfolioAnalysis, RebalanceConfig, Rebalancer};
//!
//! let result = Rebalancer::new(&market, RebalanceConfig::default()).run()?;
//! for row in PortfolioAnalysis::new(&result).cagr() {
//!     println!("{}: {:.2}%", row.portfolio, row.cagr * 100.0);
//! }
//! ```

pub mod analysis;
pub mod rebalance;
pub mod regression;
pub mod returns;

// Re-export main types
pub use analysis::{
    CagrRow, Granularity, PerformanceSummary, PeriodRow, PortfolioAnalysis, YearTable,
    benchmark_rows, cumulative_growth, max_drawdown, resample,
};
pub use rebalance::{
    Cadence, CumulativeSeries, PortfolioStats, RebalanceConfig, RebalanceResult, Rebalancer,
};
pub use regression::{
    LinearFit, Observation, Regression, RegressionConfig, RegressionResult, linregress,
    remove_outliers,
};
pub use returns::{
    ReturnEngine, Weighting, cap_weighted_return, equal_weighted_returns, months_in_window,
};
