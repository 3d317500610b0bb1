//! Data source trait for point-in-time market data.
//!
//! The ranker and the return engine never touch files or storage directly;
//! they only issue the queries defined here. This keeps the core testable
//! with small synthetic fixtures.

use crate::{Date, MetricsSnapshot, MonthlyRecord, PricePoint, Result, Ticker};
use std::collections::BTreeSet;

/// Point-in-time queries over index membership, fundamentals and prices.
///
/// Every query takes the index name. Implementations must fail with
/// [`QuintilError::Configuration`](crate::QuintilError::Configuration) when
/// the index is unknown, and must treat missing data as an empty answer
/// rather than an error.
///
/// # Example
///
/// ```no_run
/// use quintil_traits::{DataSource, Date, MetricsSnapshot, MonthlyRecord, PricePoint, Result, Ticker};
/// use std::collections::BTreeSet;
///
/// struct Empty;
///
/// impl DataSource for Empty {
///     fn membership(&self, _index: &str, _date: Date) -> Result<BTreeSet<Ticker>> {
///         Ok(BTreeSet::new())
///     }
///     fn metrics_snapshot(&self, _index: &str, date: Date) -> Result<MetricsSnapshot> {
///         Ok(MetricsSnapshot::new(date, Vec::new()))
///     }
///     fn prices(&self, _t: &str, _i: &str, _s: Date, _e: Date) -> Result<Vec<PricePoint>> {
///         Ok(Vec::new())
///     }
///     fn monthly_record(&self, _t: &str, _i: &str, _m: Date) -> Result<Option<MonthlyRecord>> {
///         Ok(None)
///     }
/// }
/// ```
pub trait DataSource {
    /// Tickers that are members of `index` on `date`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the index is unknown.
    fn membership(&self, index: &str, date: Date) -> Result<BTreeSet<Ticker>>;

    /// The last fundamental report at or before `date` for every member of
    /// `index` on `date`.
    ///
    /// Members without any report on or before `date` are left out.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the index is unknown.
    fn metrics_snapshot(&self, index: &str, date: Date) -> Result<MetricsSnapshot>;

    /// Close prices of `ticker` in the half-open window `[start, end)`,
    /// sorted by date. Empty when the ticker has no data in range.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the index is unknown.
    fn prices(&self, ticker: &str, index: &str, start: Date, end: Date) -> Result<Vec<PricePoint>>;

    /// Market cap and monthly return of `ticker` for the month starting at
    /// `month`, if available.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the index is unknown.
    fn monthly_record(&self, ticker: &str, index: &str, month: Date)
    -> Result<Option<MonthlyRecord>>;
}
