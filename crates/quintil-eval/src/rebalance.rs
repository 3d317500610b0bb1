//! Periodic re-ranking and holding-period simulation.
//!
//! Starting at the configured start date, the universe is ranked, every
//! bucket is held until the next rebalancing date, and the bucket returns
//! are appended to one cumulative series per bucket. Missing returns are
//! replaced by zero once the loop completes.

use crate::returns::{ReturnEngine, Weighting};
use chrono::{Datelike, Days, Months};
use polars::prelude::*;
use quintil_rank::{Metric, Ranker};
use quintil_traits::stats::{SummaryStats, compound_return};
use quintil_traits::{
    Bucket, DataSource, Date, QuintilError, Result, ReturnSeries, Ticker, date_to_epoch_days,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Name of the whole-index series in error messages.
const UNIVERSE_LABEL: &str = "universe";

/// Rebalancing cadence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    /// Every calendar month
    Monthly,
    /// Every three calendar months
    Quarterly,
    /// Every 365 days
    #[default]
    Yearly,
}

impl Cadence {
    /// The rebalancing date following `date`.
    ///
    /// Month steps clamp to the end of shorter months, so repeated monthly
    /// stepping from the 31st drifts to earlier days.
    ///
    /// # Errors
    ///
    /// Returns an error if the next date is out of range.
    pub fn step(&self, date: Date) -> Result<Date> {
        let next = match self {
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Quarterly => date.checked_add_months(Months::new(3)),
            Self::Yearly => date.checked_add_days(Days::new(365)),
        };
        next.ok_or_else(|| QuintilError::InvalidDate(format!("cannot step {self} past {date}")))
    }

    /// Canonical identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = QuintilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" | "annual" => Ok(Self::Yearly),
            other => Err(QuintilError::Configuration(format!(
                "invalid frequency '{other}'; choose from 'monthly', 'quarterly', or 'yearly'"
            ))),
        }
    }
}

/// Rebalancing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceConfig {
    /// Index to draw the universe from
    pub index: String,
    /// Metric to rank on
    pub metric: Metric,
    /// First rebalancing date
    pub start_date: Date,
    /// Rebalancing stops once this date is reached
    pub end_date: Date,
    /// Rebalancing cadence (ignored for cap weighting, which is monthly)
    pub cadence: Cadence,
    /// Weighting scheme
    pub weighting: Weighting,
    /// Give empty buckets zero returns on the period's calendar
    pub fill_empty_periods: bool,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            index: "nasdaq100".to_string(),
            metric: Metric::Capei,
            start_date: Date::from_ymd_opt(2000, 6, 30).unwrap_or_default(),
            end_date: Date::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            cadence: Cadence::Yearly,
            weighting: Weighting::Equal,
            fill_empty_periods: true,
        }
    }
}

impl RebalanceConfig {
    /// The cadence actually used: cap weighting forces monthly.
    #[must_use]
    pub const fn effective_cadence(&self) -> Cadence {
        match self.weighting {
            Weighting::CapWeighted => Cadence::Monthly,
            Weighting::Equal => self.cadence,
        }
    }
}

/// Statistics of one bucket in one rebalancing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    /// Bucket
    pub bucket: Bucket,
    /// Rebalancing date the period starts on
    pub period_start: Date,
    /// Calendar year of `period_start`
    pub year: i32,
    /// Calendar month of `period_start`
    pub month: u32,
    /// Members held during the period
    pub tickers: Vec<Ticker>,
    /// Smallest metric value
    pub min: f64,
    /// Largest metric value
    pub max: f64,
    /// Mean metric value
    pub mean: f64,
    /// Sample standard deviation of the metric (NaN for one member)
    pub std: f64,
    /// Compounded return over the period
    pub period_return: f64,
}

/// A bucket's return history, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    bucket: Bucket,
    series: ReturnSeries,
}

impl CumulativeSeries {
    /// Create an empty series for a bucket.
    pub const fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            series: ReturnSeries::new(),
        }
    }

    /// Bucket this series belongs to.
    pub const fn bucket(&self) -> Bucket {
        self.bucket
    }

    /// The accumulated returns.
    pub const fn series(&self) -> &ReturnSeries {
        &self.series
    }

    /// Append a period's returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is not strictly increasing or does not
    /// start after the last stored date.
    pub fn append(&mut self, segment: &ReturnSeries) -> Result<()> {
        self.series.append(self.bucket.label(), segment)
    }

    /// Replace missing returns with zero, returning how many were replaced.
    pub fn fill_missing(&mut self) -> usize {
        self.series.fill_missing(0.0)
    }

    /// Convert to a DataFrame with `date` and `return` columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be built.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        self.series.to_frame()
    }
}

/// Output of a rebalanced run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceResult {
    /// Configuration the run used
    pub config: RebalanceConfig,
    /// Cadence the run used
    pub cadence: Cadence,
    /// Rebalancing dates
    pub periods: Vec<Date>,
    /// One series per bucket, in [`Bucket::ALL`] order
    pub series: Vec<CumulativeSeries>,
    /// Per-period statistics of non-empty buckets, in [`Bucket::ALL`] order
    pub stats: Vec<Vec<PortfolioStats>>,
}

impl RebalanceResult {
    fn empty(config: RebalanceConfig, cadence: Cadence) -> Self {
        Self {
            config,
            cadence,
            periods: Vec::new(),
            series: Bucket::ALL.into_iter().map(CumulativeSeries::new).collect(),
            stats: vec![Vec::new(); Bucket::ALL.len()],
        }
    }

    /// Return series of a bucket.
    pub fn series(&self, bucket: Bucket) -> &CumulativeSeries {
        &self.series[bucket.index()]
    }

    /// Period statistics of a bucket.
    pub fn stats(&self, bucket: Bucket) -> &[PortfolioStats] {
        &self.stats[bucket.index()]
    }

    /// Long-format frame of every bucket's period statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be built.
    pub fn stats_frame(&self) -> PolarsResult<DataFrame> {
        let rows: Vec<&PortfolioStats> = self.stats.iter().flatten().collect();
        let start: Vec<i32> = rows.iter().map(|s| date_to_epoch_days(s.period_start)).collect();
        let bucket: Vec<&str> = rows.iter().map(|s| s.bucket.label()).collect();
        let count: Vec<u32> = rows.iter().map(|s| s.tickers.len() as u32).collect();

        DataFrame::new(vec![
            Series::new("bucket".into(), bucket).into(),
            Series::new("period_start".into(), start)
                .cast(&DataType::Date)?
                .into(),
            Series::new("year".into(), rows.iter().map(|s| s.year).collect::<Vec<_>>()).into(),
            Series::new("month".into(), rows.iter().map(|s| s.month).collect::<Vec<_>>()).into(),
            Series::new("count".into(), count).into(),
            Series::new("min".into(), rows.iter().map(|s| s.min).collect::<Vec<_>>()).into(),
            Series::new("max".into(), rows.iter().map(|s| s.max).collect::<Vec<_>>()).into(),
            Series::new("mean".into(), rows.iter().map(|s| s.mean).collect::<Vec<_>>()).into(),
            Series::new("std".into(), rows.iter().map(|s| s.std).collect::<Vec<_>>()).into(),
            Series::new(
                "period_return".into(),
                rows.iter().map(|s| s.period_return).collect::<Vec<_>>(),
            )
            .into(),
        ])
    }
}

/// Runs the rebalancing loop against a data source.
#[derive(Debug)]
pub struct Rebalancer<'a, D: DataSource + ?Sized> {
    source: &'a D,
    config: RebalanceConfig,
}

impl<'a, D: DataSource + ?Sized> Rebalancer<'a, D> {
    /// Create a rebalancer.
    pub const fn new(source: &'a D, config: RebalanceConfig) -> Self {
        Self { source, config }
    }

    /// The configuration.
    pub const fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// Rebalancing dates: from the start date while before the end date.
    ///
    /// # Errors
    ///
    /// Returns an error if stepping leaves the representable date range.
    pub fn schedule(&self) -> Result<Vec<Date>> {
        let cadence = self.config.effective_cadence();
        let mut dates = Vec::new();
        let mut current = self.config.start_date;
        while current < self.config.end_date {
            dates.push(current);
            current = cadence.step(current)?;
        }
        Ok(dates)
    }

    /// Run the backtest.
    ///
    /// # Errors
    ///
    /// Fails before iterating on an unknown index or unsupported metric, and
    /// on any invariant violation while accumulating series.
    pub fn run(&self) -> Result<RebalanceResult> {
        let config = &self.config;
        let cadence = config.effective_cadence();
        if cadence != config.cadence {
            tracing::info!(requested = %config.cadence, "cap weighting uses monthly rebalancing");
        }

        let ranker = Ranker::new(self.source);
        ranker.validate(config.start_date, &config.index, config.metric)?;
        let engine = ReturnEngine::new(self.source);
        let mut result = RebalanceResult::empty(config.clone(), cadence);

        for current in self.schedule()? {
            let next = cadence.step(current)?;
            let ranking = ranker.rank(current, &config.index, config.metric)?;

            let mut segments = Vec::with_capacity(Bucket::ALL.len());
            for bucket in Bucket::ALL {
                let tickers = ranking.tickers(bucket);
                let segment =
                    engine.period_return(&tickers, current, next, &config.index, config.weighting)?;
                segments.push(segment);
            }

            if config.fill_empty_periods {
                fill_empty_segments(&mut segments);
            }

            for (bucket, segment) in Bucket::ALL.into_iter().zip(&segments) {
                result.series[bucket.index()].append(segment)?;

                let members = ranking.bucket(bucket);
                if members.is_empty() {
                    continue;
                }
                let summary = SummaryStats::from_values(&ranking.values(bucket));
                result.stats[bucket.index()].push(PortfolioStats {
                    bucket,
                    period_start: current,
                    year: current.year(),
                    month: current.month(),
                    tickers: ranking.tickers(bucket),
                    min: summary.min,
                    max: summary.max,
                    mean: summary.mean,
                    std: summary.std,
                    period_return: compound_return(&segment.values()),
                });
            }

            tracing::debug!(
                date = %current,
                ranked = ranking.len(),
                "rebalanced"
            );
            result.periods.push(current);
        }

        let filled: usize = result.series.iter_mut().map(CumulativeSeries::fill_missing).sum();
        tracing::info!(
            index = %config.index,
            metric = %config.metric,
            periods = result.periods.len(),
            filled,
            "backtest complete"
        );

        Ok(result)
    }

    /// Equal-weighted return of the whole index membership, re-formed at
    /// every rebalancing date. Missing returns are replaced by zero.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the index is unknown.
    pub fn universe_returns(&self) -> Result<ReturnSeries> {
        let config = &self.config;
        let cadence = config.effective_cadence();
        self.source.membership(&config.index, config.start_date)?;
        let engine = ReturnEngine::new(self.source);
        let mut out = ReturnSeries::new();

        for current in self.schedule()? {
            let next = cadence.step(current)?;
            let members: Vec<Ticker> = self
                .source
                .membership(&config.index, current)?
                .into_iter()
                .collect();
            let segment =
                engine.period_return(&members, current, next, &config.index, Weighting::Equal)?;
            out.append(UNIVERSE_LABEL, &segment)?;
        }

        out.fill_missing(0.0);
        Ok(out)
    }
}

/// Give every empty segment zero returns on the dates seen by the others.
fn fill_empty_segments(segments: &mut [ReturnSeries]) {
    let calendar: BTreeSet<Date> = segments.iter().flat_map(ReturnSeries::dates).collect();
    if calendar.is_empty() {
        return;
    }
    for segment in segments.iter_mut().filter(|s| s.is_empty()) {
        for date in &calendar {
            segment.push(*date, 0.0);
        }
    }
}
