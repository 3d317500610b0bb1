//! Data loading utilities for the Quintil CLI.

use anyhow::{Context, Result, bail};
use quintil::{DataLayout, Date, IndexPreset, MarketData};
use std::path::PathBuf;

/// Data layout from `--data-dir`, falling back to the environment.
pub(crate) fn layout(data_dir: Option<PathBuf>) -> DataLayout {
    data_dir.map_or_else(DataLayout::from_env, DataLayout::new)
}

/// Load the CSV files of one index.
pub(crate) fn load_market(layout: &DataLayout, index: &str) -> Result<(IndexPreset, MarketData)> {
    let preset: IndexPreset = index.parse()?;
    let market = MarketData::load(layout, &[preset])
        .with_context(|| format!("loading {preset} from {}", layout.data_dir.display()))?;
    Ok((preset, market))
}

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(date_str: &str) -> Result<Date> {
    Date::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{date_str}', expected YYYY-MM-DD"))
}

/// Output format of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Text,
    Json,
}

/// Parse `text` or `json`.
pub(crate) fn parse_format(format: &str) -> Result<Format> {
    match format.trim().to_lowercase().as_str() {
        "text" => Ok(Format::Text),
        "json" => Ok(Format::Json),
        other => bail!("invalid format '{other}'; use 'text' or 'json'"),
    }
}

/// Format a return as a percentage, blank when missing.
pub(crate) fn pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value * 100.0)
    } else {
        "-".to_string()
    }
}
