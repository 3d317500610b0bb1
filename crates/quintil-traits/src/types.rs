//! Common types used throughout quintil.
//!
//! This module defines the data model shared by the loader, the ranker and
//! the return engine: tickers, buckets, point-in-time metric snapshots,
//! prices and return series.

use chrono::Datelike;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A ticker symbol identifier, e.g. "AAPL".
pub type Ticker = String;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
///
/// Polars stores `Date` columns as days since the Unix epoch while chrono
/// counts from the common era.
pub const CE_TO_UNIX_EPOCH_DAYS: i32 = 719_163;

/// Convert a date to days since the Unix epoch (Polars `Date` physical value).
#[must_use]
pub fn date_to_epoch_days(date: Date) -> i32 {
    date.num_days_from_ce() - CE_TO_UNIX_EPOCH_DAYS
}

/// Convert days since the Unix epoch back to a date.
#[must_use]
pub fn epoch_days_to_date(days: i32) -> Option<Date> {
    Date::from_num_days_from_ce_opt(days + CE_TO_UNIX_EPOCH_DAYS)
}

/// First calendar day of the month containing `date`.
#[must_use]
pub fn month_start(date: Date) -> Date {
    date.with_day(1).unwrap_or(date)
}

/// A portfolio bucket produced by ranking on one metric.
///
/// `NonPositive` holds members whose metric is ≤ 0; `Q1`..`Q5` partition the
/// strictly positive members in ascending metric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    /// Metric value ≤ 0
    NonPositive,
    /// Lowest positive quintile
    Q1,
    /// Second quintile
    Q2,
    /// Third quintile
    Q3,
    /// Fourth quintile
    Q4,
    /// Highest quintile
    Q5,
}

impl Bucket {
    /// All buckets in reporting order.
    pub const ALL: [Self; 6] = [
        Self::NonPositive,
        Self::Q1,
        Self::Q2,
        Self::Q3,
        Self::Q4,
        Self::Q5,
    ];

    /// The five quintile buckets, lowest first.
    pub const QUINTILES: [Self; 5] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4, Self::Q5];

    /// Short label used in tables ("<=0", "Q1", ...).
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NonPositive => "<=0",
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
            Self::Q5 => "Q5",
        }
    }

    /// Position of this bucket in [`Bucket::ALL`].
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::NonPositive => 0,
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
            Self::Q5 => 5,
        }
    }

    /// Quintile bucket for a zero-based bin number (0 → Q1).
    #[must_use]
    pub const fn quintile(bin: usize) -> Option<Self> {
        match bin {
            0 => Some(Self::Q1),
            1 => Some(Self::Q2),
            2 => Some(Self::Q3),
            3 => Some(Self::Q4),
            4 => Some(Self::Q5),
            _ => None,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single close price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observation date
    pub date: Date,
    /// Close price
    pub close: f64,
}

/// Monthly market capitalization and return for one ticker.
///
/// Missing values are stored as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// Ticker symbol
    pub ticker: Ticker,
    /// First day of the month
    pub month: Date,
    /// Market capitalization at month end
    pub market_cap: f64,
    /// Monthly return excluding dividends
    pub monthly_return: f64,
}

/// The most recent fundamental report of one ticker as of a snapshot date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Date the report became public
    pub effective_date: Option<Date>,
    /// Metric name → value; missing metrics are absent
    pub values: BTreeMap<String, f64>,
}

/// Point-in-time fundamental metrics for an index universe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    date: Option<Date>,
    columns: BTreeSet<String>,
    rows: BTreeMap<Ticker, SnapshotRow>,
}

impl MetricsSnapshot {
    /// Create an empty snapshot taken at `date` over the given metric columns.
    pub fn new(date: Date, columns: impl IntoIterator<Item = String>) -> Self {
        Self {
            date: Some(date),
            columns: columns.into_iter().collect(),
            rows: BTreeMap::new(),
        }
    }

    /// Insert (or replace) a ticker's row.
    pub fn insert(&mut self, ticker: impl Into<Ticker>, row: SnapshotRow) {
        self.rows.insert(ticker.into(), row);
    }

    /// Snapshot date.
    pub const fn date(&self) -> Option<Date> {
        self.date
    }

    /// Metric columns available in the source data.
    pub const fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    /// Checks if a metric column exists in the source data.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Value of `metric` for `ticker`, if reported.
    pub fn value(&self, ticker: &str, metric: &str) -> Option<f64> {
        self.rows
            .get(ticker)
            .and_then(|row| row.values.get(metric))
            .copied()
    }

    /// Row for a ticker.
    pub fn row(&self, ticker: &str) -> Option<&SnapshotRow> {
        self.rows.get(ticker)
    }

    /// Tickers present in the snapshot, sorted.
    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.rows.keys()
    }

    /// Iterate over (ticker, row) pairs in ticker order.
    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &SnapshotRow)> {
        self.rows.iter()
    }

    /// Number of tickers in the snapshot.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot holds no tickers.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One dated return observation. Missing returns are NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    /// Observation date
    pub date: Date,
    /// Simple return for the step ending on `date`
    pub value: f64,
}

/// An ordered sequence of dated returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    /// Create an empty series.
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Append one observation.
    pub fn push(&mut self, date: Date, value: f64) {
        self.points.push(ReturnPoint { date, value });
    }

    /// The underlying observations.
    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    /// Iterate over observations.
    pub fn iter(&self) -> impl Iterator<Item = &ReturnPoint> {
        self.points.iter()
    }

    /// Observation dates in series order.
    pub fn dates(&self) -> Vec<Date> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Return values in series order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First observation date.
    pub fn first_date(&self) -> Option<Date> {
        self.points.first().map(|p| p.date)
    }

    /// Last observation date.
    pub fn last_date(&self) -> Option<Date> {
        self.points.last().map(|p| p.date)
    }

    /// Compounded return over the finite observations: Π(1 + r) − 1.
    pub fn total_return(&self) -> f64 {
        crate::stats::compound_return(&self.values())
    }

    /// Replace every non-finite return with `fill`, returning how many were replaced.
    pub fn fill_missing(&mut self, fill: f64) -> usize {
        let mut replaced = 0;
        for p in &mut self.points {
            if !p.value.is_finite() {
                p.value = fill;
                replaced += 1;
            }
        }
        replaced
    }

    /// Whether dates are strictly increasing.
    pub fn is_strictly_increasing(&self) -> bool {
        self.points.windows(2).all(|w| w[0].date < w[1].date)
    }

    /// Append a segment that starts after the last stored date.
    ///
    /// `label` names the series in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is not strictly increasing or overlaps
    /// the stored dates.
    pub fn append(&mut self, label: &str, segment: &Self) -> crate::Result<()> {
        if !segment.is_strictly_increasing() {
            return Err(crate::QuintilError::InvalidData(format!(
                "{label} segment dates are not strictly increasing"
            )));
        }
        if let (Some(last), Some(first)) = (self.last_date(), segment.first_date())
            && first <= last
        {
            return Err(crate::QuintilError::InvalidData(format!(
                "{label} segment starting {first} overlaps series ending {last}"
            )));
        }
        self.points.extend_from_slice(&segment.points);
        Ok(())
    }

    /// Convert to a two-column DataFrame (`date`, `return`).
    ///
    /// # Errors
    ///
    /// Returns an error if the date column cannot be cast.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let days: Vec<i32> = self.points.iter().map(|p| date_to_epoch_days(p.date)).collect();
        let date = Series::new("date".into(), days).cast(&DataType::Date)?;
        let ret = Series::new("return".into(), self.values());
        DataFrame::new(vec![date.into(), ret.into()])
    }
}

impl FromIterator<ReturnPoint> for ReturnSeries {
    fn from_iter<I: IntoIterator<Item = ReturnPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
