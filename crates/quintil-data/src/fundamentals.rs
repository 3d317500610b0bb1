//! Point-in-time fundamental metrics.

use crate::frame::{date_column, f64_column, is_metric_dtype, require_columns, string_column};
use polars::prelude::DataFrame;
use quintil_traits::{Date, MetricsSnapshot, Result, SnapshotRow, Ticker};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One report: its public date and a value per metric column (NaN if absent).
#[derive(Debug, Clone)]
struct Report {
    date: Date,
    values: Vec<f64>,
}

/// Fundamental metric reports per ticker, sorted by public date.
#[derive(Debug, Clone, Default)]
pub struct FundamentalsTable {
    columns: Vec<String>,
    reports: HashMap<Ticker, Vec<Report>>,
}

impl FundamentalsTable {
    /// Build the table from a frame of reports.
    ///
    /// Every column other than `ticker_col` and `date_col` that holds
    /// numeric data is treated as a metric. Rows without a ticker or a date
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticker or date column is missing.
    pub fn from_frame(df: &DataFrame, ticker_col: &str, date_col: &str) -> Result<Self> {
        require_columns(df, &[ticker_col, date_col])?;

        let tickers = string_column(df, ticker_col)?;
        let dates = date_column(df, date_col)?;

        let mut columns = Vec::new();
        let mut column_values = Vec::new();
        for col in df.get_columns() {
            let name = col.name().as_str();
            if name == ticker_col || name == date_col || !is_metric_dtype(col.dtype()) {
                continue;
            }
            columns.push(name.to_string());
            column_values.push(f64_column(df, name)?);
        }

        let mut reports: HashMap<Ticker, Vec<Report>> = HashMap::new();
        for (row, (ticker, date)) in tickers.into_iter().zip(dates).enumerate() {
            let (Some(ticker), Some(date)) = (ticker, date) else {
                continue;
            };
            let values = column_values.iter().map(|c| c[row]).collect();
            reports.entry(ticker).or_default().push(Report { date, values });
        }

        // Stable: among reports sharing a date, the later row wins on lookup.
        for list in reports.values_mut() {
            list.sort_by_key(|r| r.date);
        }

        tracing::debug!(
            tickers = reports.len(),
            metrics = columns.len(),
            "built fundamentals table"
        );

        Ok(Self { columns, reports })
    }

    /// Metric column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of tickers with at least one report.
    pub fn ticker_count(&self) -> usize {
        self.reports.len()
    }

    /// The most recent report for `ticker` at or before `date`.
    fn latest(&self, ticker: &str, date: Date) -> Option<&Report> {
        let list = self.reports.get(ticker)?;
        let idx = list.partition_point(|r| r.date <= date);
        idx.checked_sub(1).map(|i| &list[i])
    }

    /// Snapshot of the latest report at or before `date` for each ticker.
    ///
    /// Tickers without a report on or before `date` are excluded. Only finite
    /// metric values are carried into the snapshot.
    pub fn snapshot(&self, tickers: &BTreeSet<Ticker>, date: Date) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::new(date, self.columns.iter().cloned());

        for ticker in tickers {
            let Some(report) = self.latest(ticker, date) else {
                tracing::debug!(%ticker, %date, "no fundamentals on or before date");
                continue;
            };

            let values: BTreeMap<String, f64> = self
                .columns
                .iter()
                .zip(&report.values)
                .filter(|(_, v)| v.is_finite())
                .map(|(name, v)| (name.clone(), *v))
                .collect();

            snapshot.insert(
                ticker.clone(),
                SnapshotRow {
                    effective_date: Some(report.date),
                    values,
                },
            );
        }

        snapshot
    }
}
