//! Loaded market data for one or more indices.
//!
//! `MarketData` is constructed once per run and handed to the ranker and the
//! return engine; nothing is cached in process-wide state.

use crate::frame::read_csv;
use crate::fundamentals::FundamentalsTable;
use crate::layout::{DataLayout, IndexPreset, MembershipKind};
use crate::membership::Membership;
use crate::monthly::MonthlyTable;
use crate::prices::PriceTable;
use polars::prelude::DataFrame;
use quintil_traits::{
    DataSource, Date, MetricsSnapshot, MonthlyRecord, PricePoint, QuintilError, Result, Ticker,
};
use std::collections::{BTreeMap, BTreeSet};

/// All data for one index.
#[derive(Debug, Clone)]
pub struct IndexData {
    name: String,
    membership: Membership,
    fundamentals: FundamentalsTable,
    prices: PriceTable,
    monthly: Option<MonthlyTable>,
}

impl IndexData {
    /// Assemble index data from already-built tables.
    pub fn new(
        name: impl Into<String>,
        membership: Membership,
        fundamentals: FundamentalsTable,
        prices: PriceTable,
    ) -> Self {
        Self {
            name: name.into(),
            membership,
            fundamentals,
            prices,
            monthly: None,
        }
    }

    /// Attach monthly cap/return data for cap weighting.
    #[must_use]
    pub fn with_monthly(mut self, monthly: MonthlyTable) -> Self {
        self.monthly = Some(monthly);
        self
    }

    /// Build index data from DataFrames using a preset's column names.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column is missing.
    pub fn from_frames(
        preset: IndexPreset,
        membership: &DataFrame,
        metrics: &DataFrame,
        prices: &DataFrame,
    ) -> Result<Self> {
        let schema = preset.schema();

        let membership = match (schema.membership_kind, &schema.membership_thru) {
            (MembershipKind::Ranges, Some(thru)) => Membership::from_ranges_frame(
                membership,
                &schema.membership_ticker,
                &schema.membership_date,
                thru,
            )?,
            (MembershipKind::Ranges, None) => {
                return Err(QuintilError::Configuration(format!(
                    "range membership for '{preset}' needs a thru column"
                )));
            }
            (MembershipKind::Snapshots, _) => Membership::from_snapshots_frame(
                membership,
                &schema.membership_ticker,
                &schema.membership_date,
            )?,
        };

        let fundamentals =
            FundamentalsTable::from_frame(metrics, &schema.metrics_ticker, &schema.metrics_date)?;
        let prices = PriceTable::from_frame(
            prices,
            &schema.price_ticker,
            &schema.price_date,
            &schema.price_close,
        )?;

        Ok(Self::new(preset.name(), membership, fundamentals, prices))
    }

    /// Load an index's CSV files from the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or malformed.
    pub fn load(layout: &DataLayout, preset: IndexPreset) -> Result<Self> {
        let schema = preset.schema();
        tracing::info!(index = %preset, dir = %layout.data_dir.display(), "loading index data");

        let membership = read_csv(&layout.path(&schema.membership_file))?;
        let metrics = read_csv(&layout.path(&schema.metrics_file))?;
        let prices = read_csv(&layout.path(&schema.prices_file))?;

        let data = Self::from_frames(preset, &membership, &metrics, &prices)?;
        tracing::info!(
            index = %preset,
            fundamentals = data.fundamentals.ticker_count(),
            priced = data.prices.ticker_count(),
            "index data ready"
        );
        Ok(data)
    }

    /// Index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Membership definition.
    pub const fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Fundamentals table.
    pub const fn fundamentals(&self) -> &FundamentalsTable {
        &self.fundamentals
    }

    /// Price table.
    pub const fn prices(&self) -> &PriceTable {
        &self.prices
    }
}

/// Market data for a set of indices, queryable through [`DataSource`].
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    indices: BTreeMap<String, IndexData>,
}

impl MarketData {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an index.
    #[must_use]
    pub fn with_index(mut self, data: IndexData) -> Self {
        self.insert(data);
        self
    }

    /// Add (or replace) an index.
    pub fn insert(&mut self, data: IndexData) {
        self.indices.insert(data.name.clone(), data);
    }

    /// Load the given presets from disk.
    ///
    /// The monthly cap file is optional: when configured but absent, cap
    /// weighting is unavailable and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns an error if any index file is missing or malformed.
    pub fn load(layout: &DataLayout, presets: &[IndexPreset]) -> Result<Self> {
        let monthly = match &layout.monthly_file {
            Some(file) => {
                let path = layout.path(file);
                if path.exists() {
                    let df = read_csv(&path)?;
                    Some(MonthlyTable::from_frame(
                        &df,
                        &layout.monthly_date,
                        &layout.monthly_ticker,
                        &layout.monthly_cap,
                        &layout.monthly_return,
                    )?)
                } else {
                    tracing::warn!(path = %path.display(), "monthly cap file not found; cap weighting disabled");
                    None
                }
            }
            None => None,
        };

        let mut market = Self::new();
        for preset in presets {
            let mut data = IndexData::load(layout, *preset)?;
            if let Some(table) = &monthly {
                data = data.with_monthly(table.clone());
            }
            market.insert(data);
        }
        Ok(market)
    }

    /// Names of the loaded indices.
    pub fn index_names(&self) -> Vec<&str> {
        self.indices.keys().map(String::as_str).collect()
    }

    /// Data for one index.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the index is not loaded.
    pub fn index(&self, name: &str) -> Result<&IndexData> {
        self.indices.get(name).ok_or_else(|| {
            QuintilError::Configuration(format!(
                "invalid index '{name}'; loaded indices: {}",
                self.index_names().join(", ")
            ))
        })
    }
}

impl DataSource for MarketData {
    fn membership(&self, index: &str, date: Date) -> Result<BTreeSet<Ticker>> {
        Ok(self.index(index)?.membership.members(date))
    }

    fn metrics_snapshot(&self, index: &str, date: Date) -> Result<MetricsSnapshot> {
        let data = self.index(index)?;
        let members = data.membership.members(date);
        Ok(data.fundamentals.snapshot(&members, date))
    }

    fn prices(&self, ticker: &str, index: &str, start: Date, end: Date) -> Result<Vec<PricePoint>> {
        let points = self.index(index)?.prices.range(ticker, start, end);
        if points.is_empty() {
            tracing::debug!(%ticker, %start, %end, "no price data in range");
        }
        Ok(points)
    }

    fn monthly_record(
        &self,
        ticker: &str,
        index: &str,
        month: Date,
    ) -> Result<Option<MonthlyRecord>> {
        let data = self.index(index)?;
        Ok(data
            .monthly
            .as_ref()
            .and_then(|table| table.get(ticker, month))
            .cloned())
    }
}
