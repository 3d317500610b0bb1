#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! ## Crate Organization
//!
//! - [`traits`] - Shared types and the [`DataSource`] trait
//! - [`data`] - Market data loading
//! - [`rank`] - Metric registry and the quintile [`Ranker`]
//! - [`eval`] - Return engine, [`Rebalancer`], analysis and regression
//! - [`bench`] - Benchmark index client

/// Version of the quintil crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Types
// ============================================================================

/// Shared types, the data source trait, and statistics helpers.
pub mod traits {
    pub use quintil_traits::*;
}

pub use quintil_traits::{
    Bucket, DataSource, Date, PricePoint, QuintilError, Result, ReturnSeries, Ticker,
};

// ============================================================================
// Data Loading
// ============================================================================

/// Market data loading from CSV files or DataFrames.
///
/// ```ignore
/// use quintil::data::{DataLayout, IndexPreset, MarketData};
///
/// let market = MarketData::load(&DataLayout::new("data"), &[IndexPreset::Nasdaq100])?;
/// ```
pub mod data {
    pub use quintil_data::*;
}

pub use quintil_data::{DataLayout, IndexPreset, MarketData};

// ============================================================================
// Ranking
// ============================================================================

/// Metric registry and quintile ranking.
pub mod rank {
    pub use quintil_rank::*;
}

pub use quintil_rank::{Metric, MetricCategory, Ranker, Ranking};

// ============================================================================
// Evaluation
// ============================================================================

/// Portfolio returns, rebalanced backtests, analysis and regression.
///
/// ## Return Weighting
///
/// - **Equal**: daily mean of member price changes
/// - **Cap-weighted**: monthly returns weighted by market-cap share; forces
///   a monthly rebalancing cadence
///
/// ## CAGR
///
/// ```text
/// CAGR = (Π(1 + r))^(1 / years) - 1
/// ```
///
/// where `years` counts the distinct calendar years observed.
pub mod eval {
    pub use quintil_eval::*;
}

pub use quintil_eval::{
    Cadence, PortfolioAnalysis, RebalanceConfig, RebalanceResult, Rebalancer, Regression,
    RegressionConfig, Weighting,
};

// ============================================================================
// Benchmarks
// ============================================================================

/// Benchmark index prices and rolling returns.
///
/// Set `QUINTIL_BENCHMARK_URL` to use another chart endpoint.
pub mod bench {
    pub use quintil_bench::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use quintil::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Bucket, Cadence, DataLayout, DataSource, Date, IndexPreset, MarketData, Metric,
        PortfolioAnalysis, QuintilError, RebalanceConfig, Rebalancer, Ranker, Regression,
        RegressionConfig, Result, Weighting,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
    }

    #[test]
    fn test_prelude_runs_a_backtest_over_empty_market() {
        use prelude::*;

        let market = MarketData::new();
        let err = Rebalancer::new(&market, RebalanceConfig::default())
            .run()
            .unwrap_err();
        assert!(matches!(err, QuintilError::Configuration(_)));
    }

    #[test]
    fn test_metric_lookup_through_facade() {
        let metric: Metric = "bm".parse().unwrap();
        assert_eq!(metric.category(), MetricCategory::Valuation);
    }
}
