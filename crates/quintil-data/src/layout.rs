//! Supported index presets and on-disk data layout.

use quintil_traits::QuintilError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable pointing at the data directory.
pub const DATA_DIR_ENV: &str = "QUINTIL_DATA_DIR";

/// How a membership file encodes constituents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipKind {
    /// `(ticker, from, thru)` validity ranges
    Ranges,
    /// `(date, ticker)` full-membership snapshots
    Snapshots,
}

/// File and column names for one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSchema {
    /// Constituents file name
    pub membership_file: String,
    /// Constituents encoding
    pub membership_kind: MembershipKind,
    /// Ticker column in the constituents file
    pub membership_ticker: String,
    /// `from` column (ranges) or snapshot date column (snapshots)
    pub membership_date: String,
    /// `thru` column (ranges only)
    pub membership_thru: Option<String>,
    /// Fundamentals file name
    pub metrics_file: String,
    /// Ticker column in the fundamentals file
    pub metrics_ticker: String,
    /// Public-date column in the fundamentals file
    pub metrics_date: String,
    /// Daily prices file name
    pub prices_file: String,
    /// Ticker column in the prices file
    pub price_ticker: String,
    /// Date column in the prices file
    pub price_date: String,
    /// Close price column in the prices file
    pub price_close: String,
}

/// Indices with a known source layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexPreset {
    /// NASDAQ 100 (CRSP/Compustat)
    Nasdaq100,
    /// Russell Top 200 (CRSP/Compustat)
    Russell200,
}

impl IndexPreset {
    /// All presets.
    pub const ALL: [Self; 2] = [Self::Nasdaq100, Self::Russell200];

    /// Canonical index name used in queries.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Nasdaq100 => "nasdaq100",
            Self::Russell200 => "russell200",
        }
    }

    /// Yahoo symbol of the benchmark index for comparisons.
    #[must_use]
    pub const fn benchmark_symbol(&self) -> &'static str {
        match self {
            Self::Nasdaq100 => "^NDX",
            Self::Russell200 => "^RUT",
        }
    }

    /// File and column layout.
    #[must_use]
    pub fn schema(&self) -> SourceSchema {
        match self {
            Self::Nasdaq100 => SourceSchema {
                membership_file: "nasdaqconstituents.csv".into(),
                membership_kind: MembershipKind::Ranges,
                membership_ticker: "co_tic".into(),
                membership_date: "from".into(),
                membership_thru: Some("thru".into()),
                metrics_file: "nasdaq100historicaldata.csv".into(),
                metrics_ticker: "TICKER".into(),
                metrics_date: "public_date".into(),
                prices_file: "nasdaqprices.csv".into(),
                price_ticker: "tic".into(),
                price_date: "datadate".into(),
                price_close: "prccd".into(),
            },
            Self::Russell200 => SourceSchema {
                membership_file: "russell200constituents.csv".into(),
                membership_kind: MembershipKind::Snapshots,
                membership_ticker: "Ticker".into(),
                membership_date: "Date".into(),
                membership_thru: None,
                metrics_file: "russell200historicaldata.csv".into(),
                metrics_ticker: "TICKER".into(),
                metrics_date: "public_date".into(),
                prices_file: "russell200prices.csv".into(),
                price_ticker: "tic".into(),
                price_date: "datadate".into(),
                price_close: "prccd".into(),
            },
        }
    }
}

impl fmt::Display for IndexPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexPreset {
    type Err = QuintilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nasdaq100" | "nasdaq" | "ndx" => Ok(Self::Nasdaq100),
            "russell200" | "russell" => Ok(Self::Russell200),
            other => Err(QuintilError::Configuration(format!(
                "invalid index '{other}'; use 'nasdaq100' or 'russell200'"
            ))),
        }
    }
}

/// Location of the source CSV files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLayout {
    /// Directory holding all source files
    pub data_dir: PathBuf,
    /// Monthly cap/return file name, if cap weighting is wanted
    pub monthly_file: Option<String>,
    /// Date column in the monthly file
    pub monthly_date: String,
    /// Ticker column in the monthly file
    pub monthly_ticker: String,
    /// Market cap column in the monthly file
    pub monthly_cap: String,
    /// Monthly return column in the monthly file
    pub monthly_return: String,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            monthly_file: Some("monthly.csv".into()),
            monthly_date: "date".into(),
            monthly_ticker: "Ticker".into(),
            monthly_cap: "MthCap".into(),
            monthly_return: "MthRetx".into(),
        }
    }
}

impl DataLayout {
    /// Layout rooted at `data_dir` with default file names.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Layout rooted at `QUINTIL_DATA_DIR`, falling back to `./data`.
    ///
    /// This will also load from a `.env` file if present.
    pub fn from_env() -> Self {
        // Try to load .env file (ignore errors if not found)
        let _ = dotenvy::dotenv();

        env::var(DATA_DIR_ENV).map_or_else(|_| Self::default(), Self::new)
    }

    /// Full path of a file in the data directory.
    #[must_use]
    pub fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!("nasdaq100".parse::<IndexPreset>().unwrap(), IndexPreset::Nasdaq100);
        assert_eq!("Russell200".parse::<IndexPreset>().unwrap(), IndexPreset::Russell200);
        let err = "sp500".parse::<IndexPreset>().unwrap_err();
        assert!(matches!(err, QuintilError::Configuration(_)));
    }

    #[test]
    fn test_preset_schema() {
        let nasdaq = IndexPreset::Nasdaq100.schema();
        assert_eq!(nasdaq.membership_kind, MembershipKind::Ranges);
        assert_eq!(nasdaq.membership_thru.as_deref(), Some("thru"));

        let russell = IndexPreset::Russell200.schema();
        assert_eq!(russell.membership_kind, MembershipKind::Snapshots);
        assert!(russell.membership_thru.is_none());
        assert_eq!(IndexPreset::Russell200.benchmark_symbol(), "^RUT");
    }

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::new("/tmp/quintil");
        assert_eq!(
            layout.path("nasdaqprices.csv"),
            PathBuf::from("/tmp/quintil/nasdaqprices.csv")
        );
        assert_eq!(layout.monthly_file.as_deref(), Some("monthly.csv"));
    }
}
