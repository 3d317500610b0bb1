//! Cross-sectional regression of holding-period returns on a metric.
//!
//! Every index member ranked at the start date contributes one observation:
//! its metric value and its price return between the start and end dates.
//! Outliers are removed with an interquartile-range filter on both
//! variables before fitting an ordinary least squares line.

use chrono::Days;
use ndarray::Array1;
use quintil_rank::{Metric, Ranker};
use quintil_traits::stats::quantile;
use quintil_traits::{DataSource, Date, QuintilError, Result, Ticker};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Regression configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionConfig {
    /// Index to draw the universe from
    pub index: String,
    /// Metric used as the explanatory variable
    pub metric: Metric,
    /// Date the metric is observed and the holding period starts
    pub start_date: Date,
    /// Last date of the holding period (inclusive)
    pub end_date: Date,
    /// IQR multiple beyond the quartiles at which points are dropped
    pub outlier_threshold: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            index: "nasdaq100".to_string(),
            metric: Metric::Bm,
            start_date: Date::from_ymd_opt(2014, 6, 30).unwrap_or_default(),
            end_date: Date::from_ymd_opt(2024, 6, 30).unwrap_or_default(),
            outlier_threshold: 3.0,
        }
    }
}

/// One ticker's metric value and holding-period return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Ticker symbol
    pub ticker: Ticker,
    /// Metric value at the start date
    pub metric_value: f64,
    /// Price return over the holding period
    pub period_return: f64,
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Slope
    pub slope: f64,
    /// Intercept
    pub intercept: f64,
    /// Pearson correlation coefficient
    pub r_value: f64,
    /// Two-sided p-value for a zero slope
    pub p_value: f64,
    /// Standard error of the slope
    pub std_err: f64,
    /// Number of points
    pub n: usize,
}

impl LinearFit {
    /// Coefficient of determination.
    #[must_use]
    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }

    /// Fitted value at `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a least squares line through `(x, y)`.
///
/// # Errors
///
/// Returns an error for mismatched lengths, fewer than three points, or
/// constant `x`.
pub fn linregress(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(QuintilError::InvalidData(format!(
            "x has {} points but y has {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 3 {
        return Err(QuintilError::InvalidData(format!(
            "regression needs at least 3 points, got {n}"
        )));
    }

    let x = Array1::from_vec(x.to_vec());
    let y = Array1::from_vec(y.to_vec());
    let x_mean = x.mean().unwrap_or(f64::NAN);
    let y_mean = y.mean().unwrap_or(f64::NAN);
    let dx = &x - x_mean;
    let dy = &y - y_mean;

    let ssxm = dx.dot(&dx);
    let ssym = dy.dot(&dy);
    let ssxym = dx.dot(&dy);
    if ssxm == 0.0 {
        return Err(QuintilError::InvalidData(
            "all x values are identical".to_string(),
        ));
    }

    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;
    let r_value = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };

    let df = (n - 2) as f64;
    let std_err = ((1.0 - r_value * r_value) * ssym / ssxm / df).sqrt();
    let p_value = if r_value.abs() >= 1.0 {
        0.0
    } else {
        let t = r_value * (df / ((1.0 - r_value) * (1.0 + r_value))).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| QuintilError::Other(format!("t distribution: {e}")))?;
        2.0 * dist.sf(t.abs())
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_value,
        p_value,
        std_err,
        n,
    })
}

/// Drop observations outside `[Q1 − k·IQR, Q3 + k·IQR]` on either variable.
pub fn remove_outliers(observations: &[Observation], threshold: f64) -> Vec<Observation> {
    let bounds = |values: Vec<f64>| {
        let q1 = quantile(&values, 0.25);
        let q3 = quantile(&values, 0.75);
        let iqr = q3 - q1;
        (q1 - threshold * iqr, q3 + threshold * iqr)
    };
    let (metric_lo, metric_hi) = bounds(observations.iter().map(|o| o.metric_value).collect());
    let (return_lo, return_hi) = bounds(observations.iter().map(|o| o.period_return).collect());

    observations
        .iter()
        .filter(|o| {
            (metric_lo..=metric_hi).contains(&o.metric_value)
                && (return_lo..=return_hi).contains(&o.period_return)
        })
        .cloned()
        .collect()
}

/// Result of a metric-versus-return regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Configuration used
    pub config: RegressionConfig,
    /// Observations kept after outlier removal
    pub observations: Vec<Observation>,
    /// Observations removed as outliers
    pub removed: usize,
    /// Fitted line
    pub fit: LinearFit,
}

/// Collects observations and fits the regression.
#[derive(Debug)]
pub struct Regression<'a, D: DataSource + ?Sized> {
    source: &'a D,
    config: RegressionConfig,
}

impl<'a, D: DataSource + ?Sized> Regression<'a, D> {
    /// Create a regression over a data source.
    pub const fn new(source: &'a D, config: RegressionConfig) -> Self {
        Self { source, config }
    }

    /// Metric value at the start date and price return to the end date for
    /// every ranked member.
    ///
    /// The start price is the first close on or after the start date and the
    /// end price the last close on or before the end date. Members without
    /// prices in the window are skipped.
    ///
    /// # Errors
    ///
    /// Fails on an unknown index or unsupported metric.
    pub fn observations(&self) -> Result<Vec<Observation>> {
        let config = &self.config;
        let ranking =
            Ranker::new(self.source).rank(config.start_date, &config.index, config.metric)?;
        let window_end = config
            .end_date
            .checked_add_days(Days::new(1))
            .unwrap_or(config.end_date);

        let mut out = Vec::with_capacity(ranking.len());
        for (_, members) in ranking.iter() {
            for member in members {
                let prices = self.source.prices(
                    &member.ticker,
                    &config.index,
                    config.start_date,
                    window_end,
                )?;
                let (Some(first), Some(last)) = (prices.first(), prices.last()) else {
                    continue;
                };
                let period_return = last.close / first.close - 1.0;
                if period_return.is_finite() {
                    out.push(Observation {
                        ticker: member.ticker.clone(),
                        metric_value: member.value,
                        period_return,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Collect observations, remove outliers and fit.
    ///
    /// # Errors
    ///
    /// Fails on an unknown index or unsupported metric, or when too few
    /// observations remain to fit a line.
    pub fn run(&self) -> Result<RegressionResult> {
        let all = self.observations()?;
        let kept = remove_outliers(&all, self.config.outlier_threshold);
        let removed = all.len() - kept.len();

        let x: Vec<f64> = kept.iter().map(|o| o.metric_value).collect();
        let y: Vec<f64> = kept.iter().map(|o| o.period_return).collect();
        let fit = linregress(&x, &y)?;

        tracing::info!(
            metric = %self.config.metric,
            n = fit.n,
            removed,
            r_squared = fit.r_squared(),
            "fitted metric-return regression"
        );

        Ok(RegressionResult {
            config: self.config.clone(),
            observations: kept,
            removed,
            fit,
        })
    }
}
