//! CSV ingestion and typed column extraction.
//!
//! Source files come from different vendors and rarely agree on date
//! formats, so date columns are accepted as Polars `Date`/`Datetime`,
//! ISO-like strings, or `YYYYMMDD` integers.

use chrono::NaiveDate;
use polars::prelude::*;
use quintil_traits::{Date, QuintilError, Result, epoch_days_to_date};
use std::path::Path;

/// String formats tried, in order, when a date column arrives as text.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Read a headered CSV file into a DataFrame, parsing date-like columns.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be parsed.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(QuintilError::Configuration(format!(
            "data file not found: {}",
            path.display()
        )));
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_try_parse_dates(true)
        .with_infer_schema_length(Some(10_000))
        .finish()?
        .collect()?;

    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded csv"
    );

    Ok(df)
}

/// Fail with [`QuintilError::MissingColumn`] unless every column exists.
///
/// # Errors
///
/// Returns the first missing column name.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for col in columns {
        if df.column(col).is_err() {
            return Err(QuintilError::MissingColumn((*col).to_string()));
        }
    }
    Ok(())
}

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    Ok(df
        .column(name)
        .map_err(|_| QuintilError::MissingColumn(name.to_string()))?
        .as_materialized_series())
}

/// Extract a column as trimmed strings. Nulls and blanks become `None`.
///
/// Non-string columns are cast to strings first.
///
/// # Errors
///
/// Returns an error if the column is missing or cannot be cast.
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let s = series(df, name)?;
    let casted = if matches!(s.dtype(), DataType::String) {
        s.clone()
    } else {
        s.cast(&DataType::String)?
    };

    Ok(casted
        .str()?
        .into_iter()
        .map(|v: Option<&str>| {
            v.map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
        .collect())
}

/// Extract a column as `f64`. Nulls and unparseable values become NaN.
///
/// # Errors
///
/// Returns an error if the column is missing or cannot be cast.
pub fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let s = series(df, name)?.cast(&DataType::Float64)?;
    Ok(s.f64()?
        .into_iter()
        .map(|v: Option<f64>| v.unwrap_or(f64::NAN))
        .collect())
}

/// Extract a column as dates. Nulls and unparseable values become `None`.
///
/// # Errors
///
/// Returns an error if the column is missing or has an unsupported type.
pub fn date_column(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>> {
    let s = series(df, name)?;

    match s.dtype() {
        DataType::Date => days_to_dates(&s.cast(&DataType::Int32)?),
        DataType::Datetime(_, _) => {
            let as_date = s.cast(&DataType::Date)?;
            days_to_dates(&as_date.cast(&DataType::Int32)?)
        }
        DataType::String => Ok(s
            .str()?
            .into_iter()
            .map(|v: Option<&str>| v.and_then(parse_date))
            .collect()),
        DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => {
            let ints = s.cast(&DataType::Int64)?;
            Ok(ints
                .i64()?
                .into_iter()
                .map(|v: Option<i64>| v.and_then(|n| parse_date(&n.to_string())))
                .collect())
        }
        other => Err(QuintilError::InvalidData(format!(
            "column '{name}' has type {other} which cannot be read as dates"
        ))),
    }
}

fn days_to_dates(days: &Series) -> Result<Vec<Option<Date>>> {
    Ok(days
        .i32()?
        .into_iter()
        .map(|d: Option<i32>| d.and_then(epoch_days_to_date))
        .collect())
}

/// Parse a date string in any of the accepted formats.
///
/// Accepts full dates, a `YYYY-MM` month (mapped to the first day), and
/// timestamps whose first ten characters form an ISO date.
#[must_use]
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }

    if raw.len() == 7
        && let Ok(d) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
    {
        return Some(d);
    }

    raw.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

/// Whether a column holds metric-like data (anything but text, dates, flags).
pub(crate) fn is_metric_dtype(dtype: &DataType) -> bool {
    !matches!(
        dtype,
        DataType::String | DataType::Date | DataType::Datetime(_, _) | DataType::Boolean
    )
}
