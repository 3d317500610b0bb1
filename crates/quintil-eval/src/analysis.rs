//! Post-run analysis of bucket returns.
//!
//! Produces the data behind the usual charts: cumulative growth curves,
//! compounded annual growth per portfolio and a year × portfolio return
//! table. Benchmark rows can be added alongside the buckets.

use crate::rebalance::RebalanceResult;
use chrono::Datelike;
use polars::prelude::*;
use quintil_traits::stats::compound_return;
use quintil_traits::{Bucket, Date, QuintilError, Result, ReturnSeries};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Time granularity for resampling a return series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Leave as-is
    #[default]
    Daily,
    /// Compound within calendar quarters
    Quarterly,
    /// Compound within calendar years
    Yearly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::Quarterly => f.write_str("quarterly"),
            Self::Yearly => f.write_str("yearly"),
        }
    }
}

impl FromStr for Granularity {
    type Err = QuintilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(QuintilError::Configuration(format!(
                "invalid granularity '{other}'; choose from 'daily', 'quarterly', or 'yearly'"
            ))),
        }
    }
}

/// Last day of the period (quarter or year) containing `date`.
fn period_end(date: Date, granularity: Granularity) -> Date {
    let (year, month) = match granularity {
        Granularity::Daily => return date,
        Granularity::Quarterly => (date.year(), (date.month() - 1) / 3 * 3 + 3),
        Granularity::Yearly => (date.year(), 12),
    };
    // First day of the following month, minus one day
    let next = if month == 12 {
        Date::from_ymd_opt(year + 1, 1, 1)
    } else {
        Date::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).unwrap_or(date)
}

/// Compound returns within quarters or years, labelled by period end.
///
/// Non-finite returns count as zero.
pub fn resample(series: &ReturnSeries, granularity: Granularity) -> ReturnSeries {
    if granularity == Granularity::Daily {
        return series.clone();
    }

    let mut periods: BTreeMap<Date, Vec<f64>> = BTreeMap::new();
    for p in series.iter() {
        periods
            .entry(period_end(p.date, granularity))
            .or_default()
            .push(p.value);
    }

    let mut out = ReturnSeries::new();
    for (date, values) in periods {
        out.push(date, compound_return(&values));
    }
    out
}

/// Growth of one unit invested: running product of `1 + r`.
///
/// Non-finite returns leave the level unchanged.
pub fn cumulative_growth(series: &ReturnSeries) -> Vec<(Date, f64)> {
    let mut level = 1.0;
    series
        .iter()
        .map(|p| {
            if p.value.is_finite() {
                level *= 1.0 + p.value;
            }
            (p.date, level)
        })
        .collect()
}

/// One portfolio's return over one rebalancing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    /// Portfolio label ("<=0", "Q1", ..., or a benchmark name)
    pub portfolio: String,
    /// Calendar year of the period start
    pub year: i32,
    /// Calendar month of the period start
    pub month: u32,
    /// Period return
    pub period_return: f64,
}

/// Compounded annual growth rate of one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CagrRow {
    /// Portfolio label
    pub portfolio: String,
    /// CAGR
    pub cagr: f64,
}

/// Sum of period returns per (portfolio, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTable {
    /// Row labels, in portfolio order
    pub portfolios: Vec<String>,
    /// Column years, ascending
    pub years: Vec<i32>,
    /// `values[row][col]`; `None` where a portfolio has no period in a year
    pub values: Vec<Vec<Option<f64>>>,
}

impl YearTable {
    /// Value of one cell.
    pub fn get(&self, portfolio: &str, year: i32) -> Option<f64> {
        let row = self.portfolios.iter().position(|p| p == portfolio)?;
        let col = self.years.iter().position(|y| *y == year)?;
        self.values[row][col]
    }

    /// Wide frame: a `portfolio` column plus one column per year.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be built.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.years.len() + 1);
        columns.push(Series::new("portfolio".into(), self.portfolios.clone()).into());
        for (col, year) in self.years.iter().enumerate() {
            let values: Vec<Option<f64>> = self.values.iter().map(|row| row[col]).collect();
            columns.push(Series::new(year.to_string().into(), values).into());
        }
        DataFrame::new(columns)
    }
}

/// Performance summary of a single return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Compounded total return
    pub total_return: f64,
    /// Annualized volatility
    pub annualized_volatility: f64,
    /// Annualized Sharpe ratio (zero risk-free rate)
    pub sharpe_ratio: f64,
    /// Maximum peak-to-trough decline of cumulative growth
    pub max_drawdown: f64,
}

impl PerformanceSummary {
    /// Summarize a series observed `periods_per_year` times a year.
    pub fn from_series(series: &ReturnSeries, periods_per_year: usize) -> Self {
        let values: Vec<f64> = series.values().into_iter().filter(|v| v.is_finite()).collect();
        let stats = quintil_traits::stats::SummaryStats::from_values(&values);
        let annualizer = (periods_per_year as f64).sqrt();

        let sharpe_ratio = if stats.std.is_finite() && stats.std > 0.0 {
            stats.mean / stats.std * annualizer
        } else {
            f64::NAN
        };

        Self {
            total_return: compound_return(&values),
            annualized_volatility: stats.std * annualizer,
            sharpe_ratio,
            max_drawdown: max_drawdown(series),
        }
    }
}

/// Maximum drawdown of the cumulative growth curve, as a positive fraction.
pub fn max_drawdown(series: &ReturnSeries) -> f64 {
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for (_, level) in cumulative_growth(series) {
        peak = peak.max(level);
        worst = worst.max((peak - level) / peak);
    }
    worst
}

/// Period-level view of a backtest, optionally with benchmark rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    order: Vec<String>,
    rows: Vec<PeriodRow>,
}

impl PortfolioAnalysis {
    /// Build the analysis from every bucket's period statistics.
    pub fn new(result: &RebalanceResult) -> Self {
        let rows = Bucket::ALL
            .into_iter()
            .flat_map(|bucket| result.stats(bucket))
            .map(|s| PeriodRow {
                portfolio: s.bucket.label().to_string(),
                year: s.year,
                month: s.month,
                period_return: s.period_return,
            })
            .collect();
        Self {
            order: Bucket::ALL.iter().map(|b| b.label().to_string()).collect(),
            rows,
        }
    }

    /// Add benchmark rows under their own portfolio label.
    #[must_use]
    pub fn with_benchmark(mut self, rows: Vec<PeriodRow>) -> Self {
        for row in &rows {
            if !self.order.contains(&row.portfolio) {
                self.order.push(row.portfolio.clone());
            }
        }
        self.rows.extend(rows);
        self
    }

    /// All period rows.
    pub fn rows(&self) -> &[PeriodRow] {
        &self.rows
    }

    /// Number of distinct calendar years across all rows.
    pub fn years(&self) -> usize {
        self.rows.iter().map(|r| r.year).collect::<BTreeSet<_>>().len()
    }

    /// CAGR per portfolio: `(Π(1 + r))^(1 / years) − 1`.
    ///
    /// `years` is the number of distinct calendar years across every row, so
    /// all portfolios are annualized over the same horizon.
    pub fn cagr(&self) -> Vec<CagrRow> {
        let years = self.years();
        self.order
            .iter()
            .filter_map(|label| {
                let returns: Vec<f64> = self
                    .rows
                    .iter()
                    .filter(|r| &r.portfolio == label)
                    .map(|r| r.period_return)
                    .collect();
                if returns.is_empty() || years == 0 {
                    return None;
                }
                let growth = 1.0 + compound_return(&returns);
                Some(CagrRow {
                    portfolio: label.clone(),
                    cagr: growth.powf(1.0 / years as f64) - 1.0,
                })
            })
            .collect()
    }

    /// Year × portfolio table of summed period returns.
    pub fn year_table(&self) -> YearTable {
        let years: Vec<i32> = self
            .rows
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let values: Vec<Vec<Option<f64>>> = self
            .order
            .iter()
            .map(|label| {
                years
                    .iter()
                    .map(|year| {
                        let cell: Vec<f64> = self
                            .rows
                            .iter()
                            .filter(|r| &r.portfolio == label && r.year == *year)
                            .map(|r| r.period_return)
                            .collect();
                        (!cell.is_empty()).then(|| cell.iter().sum::<f64>())
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        YearTable {
            portfolios: self.order.clone(),
            years,
            values,
        }
    }
}

/// Benchmark rows aligned with a backtest's periods.
///
/// Takes the first rolling-return observation in `month` of each year from
/// `from_year` onward, labelled `label`.
pub fn benchmark_rows(
    rolling: &ReturnSeries,
    label: &str,
    month: u32,
    from_year: i32,
) -> Vec<PeriodRow> {
    let mut seen = BTreeSet::new();
    rolling
        .iter()
        .filter(|p| p.value.is_finite() && p.date.month() == month && p.date.year() >= from_year)
        .filter(|p| seen.insert(p.date.year()))
        .map(|p| PeriodRow {
            portfolio: label.to_string(),
            year: p.date.year(),
            month,
            period_return: p.value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(portfolio: &str, year: i32, period_return: f64) -> PeriodRow {
        PeriodRow {
            portfolio: portfolio.to_string(),
            year,
            month: 6,
            period_return,
        }
    }

    fn analysis(rows: Vec<PeriodRow>) -> PortfolioAnalysis {
        PortfolioAnalysis::default().with_benchmark(rows)
    }

    #[test]
    fn test_constant_returns_cagr() {
        let a = analysis((2010..2015).map(|y| row("Q1", y, 0.10)).collect());
        let cagr = a.cagr();
        assert_eq!(cagr.len(), 1);
        assert_relative_eq!(cagr[0].cagr, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_cagr_uses_shared_year_count() {
        let mut rows: Vec<PeriodRow> = (2010..2014).map(|y| row("Q1", y, 0.10)).collect();
        rows.push(row("Q5", 2010, 0.21));
        let a = analysis(rows);
        let cagr = a.cagr();
        assert_eq!(a.years(), 4);
        assert_eq!(cagr[1].portfolio, "Q5");
        assert_relative_eq!(cagr[1].cagr, 1.21_f64.powf(0.25) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_year_table_sums_periods() {
        let a = analysis(vec![
            row("Q1", 2010, 0.01),
            row("Q1", 2010, 0.02),
            row("Q1", 2011, 0.05),
            row("Q2", 2011, -0.03),
        ]);
        let table = a.year_table();
        assert_eq!(table.years, vec![2010, 2011]);
        assert_relative_eq!(table.get("Q1", 2010).unwrap(), 0.03, epsilon = 1e-12);
        assert_eq!(table.get("Q2", 2010), None);
        assert_relative_eq!(table.get("Q2", 2011).unwrap(), -0.03, epsilon = 1e-12);

        let df = table.to_frame().unwrap();
        assert_eq!(df.shape(), (2, 3));
    }

    #[test]
    fn test_resample_yearly_compounds() {
        let mut series = ReturnSeries::new();
        series.push(d(2020, 3, 2), 0.1);
        series.push(d(2020, 9, 1), 0.1);
        series.push(d(2021, 1, 4), -0.5);

        let yearly = resample(&series, Granularity::Yearly);
        assert_eq!(yearly.dates(), vec![d(2020, 12, 31), d(2021, 12, 31)]);
        assert_relative_eq!(yearly.values()[0], 0.21, epsilon = 1e-12);
        assert_relative_eq!(yearly.values()[1], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_resample_quarterly_labels() {
        let mut series = ReturnSeries::new();
        series.push(d(2020, 1, 2), 0.1);
        series.push(d(2020, 2, 3), f64::NAN);
        series.push(d(2020, 11, 2), 0.2);

        let quarterly = resample(&series, Granularity::Quarterly);
        assert_eq!(quarterly.dates(), vec![d(2020, 3, 31), d(2020, 12, 31)]);
        assert_relative_eq!(quarterly.values()[0], 0.1, epsilon = 1e-12);

        // Daily passes the series through, NaN included
        let daily = resample(&series, Granularity::Daily);
        assert_eq!(daily.dates(), series.dates());
        assert!(
            daily
                .values()
                .iter()
                .zip(series.values())
                .all(|(a, b)| (a.is_nan() && b.is_nan()) || *a == b)
        );
    }

    #[test]
    fn test_cumulative_growth_and_drawdown() {
        let mut series = ReturnSeries::new();
        series.push(d(2020, 1, 1), 0.5);
        series.push(d(2020, 1, 2), -0.5);
        series.push(d(2020, 1, 3), 0.2);

        let growth = cumulative_growth(&series);
        assert_relative_eq!(growth[1].1, 0.75, epsilon = 1e-12);
        assert_relative_eq!(growth[2].1, 0.9, epsilon = 1e-12);
        assert_relative_eq!(max_drawdown(&series), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_performance_summary() {
        let mut series = ReturnSeries::new();
        series.push(d(2020, 1, 1), 0.1);
        series.push(d(2021, 1, 1), 0.1);
        let summary = PerformanceSummary::from_series(&series, 1);
        assert_relative_eq!(summary.total_return, 0.21, epsilon = 1e-12);
        // Zero dispersion: Sharpe undefined
        assert!(summary.sharpe_ratio.is_nan());
        assert_relative_eq!(summary.max_drawdown, 0.0);
    }

    #[test]
    fn test_benchmark_rows_one_per_year() {
        let mut rolling = ReturnSeries::new();
        rolling.push(d(2010, 6, 1), 0.3);
        rolling.push(d(2011, 6, 1), 0.1);
        rolling.push(d(2011, 6, 2), 0.2);
        rolling.push(d(2011, 7, 1), 0.4);
        rolling.push(d(2012, 6, 1), f64::NAN);

        let rows = benchmark_rows(&rolling, "^NDX", 6, 2011);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2011);
        assert_relative_eq!(rows[0].period_return, 0.1);
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("Yearly".parse::<Granularity>().unwrap(), Granularity::Yearly);
        assert!(matches!(
            "hourly".parse::<Granularity>().unwrap_err(),
            QuintilError::Configuration(_)
        ));
    }
}
