//! Historical index membership.
//!
//! Two source shapes exist: constituent lists with `from`/`thru` validity
//! ranges (NASDAQ 100) and periodic full-membership snapshots (Russell Top
//! 200). Both answer the same question: who was in the index on a date.

use crate::frame::{date_column, string_column};
use polars::prelude::DataFrame;
use quintil_traits::{Date, Result, Ticker};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One constituent's membership interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRange {
    /// Ticker symbol
    pub ticker: Ticker,
    /// First date of membership
    pub from: Date,
    /// Last date of membership; `None` while still a member
    pub thru: Option<Date>,
}

impl MembershipRange {
    /// Whether the ticker is a member on `date` (inclusive on both ends).
    #[must_use]
    pub fn is_active(&self, date: Date) -> bool {
        self.from <= date && self.thru.is_none_or(|thru| thru >= date)
    }
}

/// Index membership over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Membership {
    /// Per-ticker validity ranges.
    Ranges(Vec<MembershipRange>),
    /// Full constituent lists keyed by snapshot date; the most recent
    /// snapshot at or before a date applies.
    Snapshots(BTreeMap<Date, BTreeSet<Ticker>>),
}

impl Membership {
    /// Members on `date`.
    #[must_use]
    pub fn members(&self, date: Date) -> BTreeSet<Ticker> {
        match self {
            Self::Ranges(ranges) => ranges
                .iter()
                .filter(|r| r.is_active(date))
                .map(|r| r.ticker.clone())
                .collect(),
            Self::Snapshots(snapshots) => snapshots
                .range(..=date)
                .next_back()
                .map(|(_, tickers)| tickers.clone())
                .unwrap_or_default(),
        }
    }

    /// Every ticker that is ever a member.
    #[must_use]
    pub fn all_tickers(&self) -> BTreeSet<Ticker> {
        match self {
            Self::Ranges(ranges) => ranges.iter().map(|r| r.ticker.clone()).collect(),
            Self::Snapshots(snapshots) => snapshots.values().flatten().cloned().collect(),
        }
    }

    /// Build range membership from a constituents frame.
    ///
    /// Rows without a ticker or a `from` date are skipped. An unparseable
    /// `thru` is treated as an open membership.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or has an unusable type.
    pub fn from_ranges_frame(
        df: &DataFrame,
        ticker_col: &str,
        from_col: &str,
        thru_col: &str,
    ) -> Result<Self> {
        let tickers = string_column(df, ticker_col)?;
        let froms = date_column(df, from_col)?;
        let thrus = date_column(df, thru_col)?;

        let mut ranges = Vec::with_capacity(tickers.len());
        let mut skipped = 0usize;
        for ((ticker, from), thru) in tickers.into_iter().zip(froms).zip(thrus) {
            match (ticker, from) {
                (Some(ticker), Some(from)) => ranges.push(MembershipRange { ticker, from, thru }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, "membership rows without ticker or start date");
        }

        Ok(Self::Ranges(ranges))
    }

    /// Build snapshot membership from a frame of (date, ticker) rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or has an unusable type.
    pub fn from_snapshots_frame(df: &DataFrame, ticker_col: &str, date_col: &str) -> Result<Self> {
        let tickers = string_column(df, ticker_col)?;
        let dates = date_column(df, date_col)?;

        let mut snapshots: BTreeMap<Date, BTreeSet<Ticker>> = BTreeMap::new();
        for (ticker, date) in tickers.into_iter().zip(dates) {
            if let (Some(ticker), Some(date)) = (ticker, date) {
                snapshots.entry(date).or_default().insert(ticker);
            }
        }

        Ok(Self::Snapshots(snapshots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_range_activity_is_inclusive() {
        let r = MembershipRange {
            ticker: "AAPL".into(),
            from: d(2010, 1, 1),
            thru: Some(d(2012, 1, 1)),
        };
        assert!(r.is_active(d(2010, 1, 1)));
        assert!(r.is_active(d(2012, 1, 1)));
        assert!(!r.is_active(d(2009, 12, 31)));
        assert!(!r.is_active(d(2012, 1, 2)));

        let open = MembershipRange {
            thru: None,
            ..r
        };
        assert!(open.is_active(d(2030, 1, 1)));
    }

    #[test]
    fn test_ranges_from_frame() {
        let df = df! {
            "co_tic" => &["AAPL", "YHOO", "MSFT"],
            "from" => &["2000-01-01", "2000-01-01", "2005-06-01"],
            "thru" => &[None, Some("2017-06-16"), None],
        }
        .unwrap();

        let membership = Membership::from_ranges_frame(&df, "co_tic", "from", "thru").unwrap();

        let early = membership.members(d(2003, 1, 1));
        assert_eq!(early.len(), 2);
        assert!(early.contains("YHOO"));

        let late = membership.members(d(2018, 1, 1));
        assert!(!late.contains("YHOO"));
        assert!(late.contains("MSFT"));
        assert!(late.contains("AAPL"));

        assert_eq!(membership.all_tickers().len(), 3);
    }

    #[test]
    fn test_snapshots_use_most_recent() {
        let df = df! {
            "Date" => &["2008-06-30", "2008-06-30", "2009-06-30"],
            "Ticker" => &["XOM", "GE", "XOM"],
        }
        .unwrap();

        let membership = Membership::from_snapshots_frame(&df, "Ticker", "Date").unwrap();

        assert!(membership.members(d(2008, 1, 1)).is_empty());
        assert_eq!(membership.members(d(2008, 12, 31)).len(), 2);

        let later = membership.members(d(2010, 1, 1));
        assert_eq!(later.len(), 1);
        assert!(later.contains("XOM"));
    }
}
