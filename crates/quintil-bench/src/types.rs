//! Chart API response types.

use chrono::DateTime;
use quintil_traits::{Date, PricePoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level chart response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    /// Response body.
    pub chart: Chart,
}

/// Chart payload: either results or an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    /// One result per requested symbol.
    pub result: Option<Vec<ChartResult>>,
    /// Error reported by the API.
    pub error: Option<ChartError>,
}

/// Error object of a chart response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartError {
    /// Short error code.
    pub code: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
}

/// Price history of one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    /// Symbol metadata.
    pub meta: Option<ChartMeta>,
    /// Bar timestamps in Unix seconds.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    /// Price arrays aligned with `timestamp`.
    pub indicators: Indicators,
}

/// Symbol metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartMeta {
    /// Symbol.
    pub symbol: String,
    /// Quote currency.
    pub currency: Option<String>,
}

/// Price arrays of a chart result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indicators {
    /// Raw OHLC quotes.
    #[serde(default)]
    pub quote: Vec<Quote>,
    /// Dividend and split adjusted closes.
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

/// Raw quote arrays. Missing bars are null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    /// Close prices.
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// Adjusted close array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjClose {
    /// Adjusted close prices.
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartResult {
    /// Daily closes in date order, preferring adjusted closes.
    ///
    /// Null or non-finite prices are skipped. When two bars share a date the
    /// later one wins.
    #[must_use]
    pub fn closes(&self) -> Vec<PricePoint> {
        let adjusted = self
            .indicators
            .adjclose
            .first()
            .map(|a| &a.adjclose)
            .filter(|a| !a.is_empty());
        let Some(prices) = adjusted.or_else(|| self.indicators.quote.first().map(|q| &q.close))
        else {
            return Vec::new();
        };

        let mut by_date: BTreeMap<Date, f64> = BTreeMap::new();
        for (ts, price) in self.timestamp.iter().zip(prices) {
            let (Some(close), Some(date)) = (price, timestamp_to_date(*ts)) else {
                continue;
            };
            if close.is_finite() {
                by_date.insert(date, *close);
            }
        }
        by_date
            .into_iter()
            .map(|(date, close)| PricePoint { date, close })
            .collect()
    }
}

/// UTC calendar date of a Unix timestamp.
fn timestamp_to_date(ts: i64) -> Option<Date> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}
