//! Daily close prices.

use crate::frame::{date_column, f64_column, string_column};
use polars::prelude::DataFrame;
use quintil_traits::{Date, PricePoint, Result, Ticker};
use std::collections::HashMap;

/// Close prices per ticker, sorted by date.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    series: HashMap<Ticker, Vec<PricePoint>>,
}

impl PriceTable {
    /// Build the table from a (ticker, date, close) frame.
    ///
    /// Rows with a missing ticker, date or non-finite close are dropped.
    /// When a ticker has two closes on the same date the later row wins.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or has an unusable type.
    pub fn from_frame(
        df: &DataFrame,
        ticker_col: &str,
        date_col: &str,
        close_col: &str,
    ) -> Result<Self> {
        let tickers = string_column(df, ticker_col)?;
        let dates = date_column(df, date_col)?;
        let closes = f64_column(df, close_col)?;

        let mut series: HashMap<Ticker, Vec<PricePoint>> = HashMap::new();
        for ((ticker, date), close) in tickers.into_iter().zip(dates).zip(closes) {
            if let (Some(ticker), Some(date)) = (ticker, date)
                && close.is_finite()
            {
                series
                    .entry(ticker)
                    .or_default()
                    .push(PricePoint { date, close });
            }
        }

        for points in series.values_mut() {
            points.sort_by_key(|p| p.date);
            // Keep the last of any duplicated dates
            points.reverse();
            points.dedup_by_key(|p| p.date);
            points.reverse();
        }

        Ok(Self { series })
    }

    /// Prices of `ticker` in `[start, end)`.
    pub fn range(&self, ticker: &str, start: Date, end: Date) -> Vec<PricePoint> {
        let Some(points) = self.series.get(ticker) else {
            return Vec::new();
        };
        let lo = points.partition_point(|p| p.date < start);
        let hi = points.partition_point(|p| p.date < end);
        if lo >= hi {
            return Vec::new();
        }
        points[lo..hi].to_vec()
    }

    /// Number of tickers with prices.
    pub fn ticker_count(&self) -> usize {
        self.series.len()
    }
}
