//! Statistical utility functions.
//!
//! This module provides the small set of descriptive statistics used when
//! summarizing portfolios and return series. All functions skip non-finite
//! inputs, mirroring how missing observations are ignored elsewhere.

use serde::{Deserialize, Serialize};

/// Descriptive statistics over a set of metric values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of finite observations.
    pub count: usize,
    /// Minimum finite value (NaN if none).
    pub min: f64,
    /// Maximum finite value (NaN if none).
    pub max: f64,
    /// Arithmetic mean (NaN if none).
    pub mean: f64,
    /// Sample standard deviation with N-1 denominator (NaN if fewer than 2).
    pub std: f64,
}

impl SummaryStats {
    /// Compute statistics over the finite values of a slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use quintil_traits::stats::SummaryStats;
    ///
    /// let stats = SummaryStats::from_values(&[1.0, 2.0, 3.0, f64::NAN]);
    /// assert_eq!(stats.count, 3);
    /// assert!((stats.mean - 2.0).abs() < 1e-12);
    /// ```
    pub fn from_values(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
        let count = finite.len();

        if count == 0 {
            return Self {
                count,
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                std: f64::NAN,
            };
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = finite.iter().sum::<f64>() / count as f64;

        // Sample variance with N-1 denominator (Bessel's correction)
        let std = if count > 1 {
            let variance =
                finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        } else {
            f64::NAN
        };

        Self {
            count,
            min,
            max,
            mean,
            std,
        }
    }
}

/// Mean of the finite values, NaN when there are none.
pub fn mean_finite(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Compounded return Π(1 + r) − 1 over the finite values.
///
/// An empty input compounds to 0.
pub fn compound_return(returns: &[f64]) -> f64 {
    returns
        .iter()
        .filter(|r| r.is_finite())
        .fold(1.0, |acc, r| acc * (1.0 + r))
        - 1.0
}

/// Quantile of the finite values using linear interpolation between order
/// statistics (position `q * (n - 1)`).
///
/// Returns NaN for empty input or `q` outside `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }

    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
