//! Portfolio return computation over one holding window.
//!
//! Two weighting schemes are supported:
//! - Equal: daily mean of member price changes
//! - Cap-weighted: monthly returns weighted by market-cap share

use chrono::Months;
use quintil_traits::{
    DataSource, Date, MonthlyRecord, PricePoint, QuintilError, Result, ReturnPoint, ReturnSeries,
    Ticker, month_start,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Portfolio weighting scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Equal weight across members, daily returns
    #[default]
    Equal,
    /// Market-cap weight, monthly returns
    CapWeighted,
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => f.write_str("equal"),
            Self::CapWeighted => f.write_str("cap_weighted"),
        }
    }
}

impl FromStr for Weighting {
    type Err = QuintilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "equal" | "ew" => Ok(Self::Equal),
            "cap_weighted" | "cap" | "mcap" => Ok(Self::CapWeighted),
            other => Err(QuintilError::Configuration(format!(
                "invalid weighting '{other}'; use 'equal' or 'cap_weighted'"
            ))),
        }
    }
}

/// Equal-weighted daily returns of a set of price series.
///
/// The output covers every date on which any series has a price. Each date's
/// return is the mean of the member changes versus their own previous price;
/// a date where no member has a previous price is NaN.
pub fn equal_weighted_returns(series: &[Vec<PricePoint>]) -> ReturnSeries {
    let mut by_date: BTreeMap<Date, (f64, usize)> = BTreeMap::new();

    for points in series {
        if let Some(first) = points.first() {
            by_date.entry(first.date).or_insert((0.0, 0));
        }
        for pair in points.windows(2) {
            let entry = by_date.entry(pair[1].date).or_insert((0.0, 0));
            let change = pair[1].close / pair[0].close - 1.0;
            if change.is_finite() {
                entry.0 += change;
                entry.1 += 1;
            }
        }
    }

    by_date
        .into_iter()
        .map(|(date, (sum, count))| {
            let value = if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            };
            ReturnPoint { date, value }
        })
        .collect()
}

/// Cap-weighted return of one month.
///
/// Members without a finite market cap carry no weight; a weighted member
/// with a missing return contributes zero. NaN when no member has a cap or
/// the caps sum to zero.
pub fn cap_weighted_return(records: &[MonthlyRecord]) -> f64 {
    let total: f64 = records
        .iter()
        .map(|r| r.market_cap)
        .filter(|c| c.is_finite())
        .sum();
    if total == 0.0 {
        return f64::NAN;
    }

    records
        .iter()
        .filter(|r| r.market_cap.is_finite())
        .map(|r| {
            let ret = if r.monthly_return.is_finite() {
                r.monthly_return
            } else {
                0.0
            };
            r.market_cap / total * ret
        })
        .sum()
}

/// First days of the months covered by `[start, end)`.
///
/// Runs from the month of `start` up to but excluding the month of `end`,
/// always including the month of `start`.
pub fn months_in_window(start: Date, end: Date) -> Vec<Date> {
    let last = month_start(end);
    let mut month = month_start(start);
    let mut months = vec![month];
    while let Some(next) = month.checked_add_months(Months::new(1)) {
        if next >= last {
            break;
        }
        months.push(next);
        month = next;
    }
    months
}

/// Computes portfolio returns from a data source.
#[derive(Debug, Clone, Copy)]
pub struct ReturnEngine<'a, D: DataSource + ?Sized> {
    source: &'a D,
}

impl<'a, D: DataSource + ?Sized> ReturnEngine<'a, D> {
    /// Create an engine over a data source.
    pub const fn new(source: &'a D) -> Self {
        Self { source }
    }

    /// Return series of a portfolio held over `[start, end)`.
    ///
    /// Empty for an empty ticker set. Tickers without data are skipped.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the index is unknown.
    pub fn period_return(
        &self,
        tickers: &[Ticker],
        start: Date,
        end: Date,
        index: &str,
        weighting: Weighting,
    ) -> Result<ReturnSeries> {
        if tickers.is_empty() {
            return Ok(ReturnSeries::new());
        }
        match weighting {
            Weighting::Equal => self.equal_weighted(tickers, start, end, index),
            Weighting::CapWeighted => self.cap_weighted(tickers, start, end, index),
        }
    }

    fn equal_weighted(
        &self,
        tickers: &[Ticker],
        start: Date,
        end: Date,
        index: &str,
    ) -> Result<ReturnSeries> {
        let mut series = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let points = self.source.prices(ticker, index, start, end)?;
            if !points.is_empty() {
                series.push(points);
            }
        }
        if series.len() < tickers.len() {
            tracing::debug!(
                %start,
                missing = tickers.len() - series.len(),
                "tickers without prices in window"
            );
        }
        Ok(equal_weighted_returns(&series))
    }

    fn cap_weighted(
        &self,
        tickers: &[Ticker],
        start: Date,
        end: Date,
        index: &str,
    ) -> Result<ReturnSeries> {
        let mut out = ReturnSeries::new();
        for month in months_in_window(start, end) {
            let mut records = Vec::with_capacity(tickers.len());
            for ticker in tickers {
                if let Some(record) = self.source.monthly_record(ticker, index, month)? {
                    records.push(record);
                }
            }
            if records.is_empty() {
                tracing::debug!(%month, "no market cap data for portfolio");
            }
            out.push(month, cap_weighted_return(&records));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn prices(points: &[(Date, f64)]) -> Vec<PricePoint> {
        points
            .iter()
            .map(|&(date, close)| PricePoint { date, close })
            .collect()
    }

    fn record(cap: f64, ret: f64) -> MonthlyRecord {
        MonthlyRecord {
            ticker: "T".into(),
            month: d(2020, 1, 1),
            market_cap: cap,
            monthly_return: ret,
        }
    }

    #[test]
    fn test_single_ticker_scenario() {
        let series = equal_weighted_returns(&[prices(&[
            (d(2020, 1, 2), 100.0),
            (d(2020, 1, 3), 110.0),
            (d(2020, 1, 6), 121.0),
        ])]);
        let values = series.values();
        assert_eq!(values.len(), 3);
        assert!(values[0].is_nan());
        assert_relative_eq!(values[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(values[2], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_across_tickers_and_union_of_dates() {
        let a = prices(&[(d(2020, 1, 2), 100.0), (d(2020, 1, 3), 110.0)]);
        let b = prices(&[
            (d(2020, 1, 2), 50.0),
            (d(2020, 1, 3), 45.0),
            (d(2020, 1, 6), 54.0),
        ]);
        let series = equal_weighted_returns(&[a, b]);
        let values = series.values();
        assert_eq!(series.dates(), vec![d(2020, 1, 2), d(2020, 1, 3), d(2020, 1, 6)]);
        assert!(values[0].is_nan());
        assert_relative_eq!(values[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(values[2], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert!(equal_weighted_returns(&[]).is_empty());
    }

    #[test]
    fn test_cap_weighted_return() {
        let r = cap_weighted_return(&[record(300.0, 0.1), record(100.0, -0.2)]);
        assert_relative_eq!(r, 0.75 * 0.1 + 0.25 * -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_cap_weights_sum_to_one() {
        // A common return passes through unchanged only if the weights sum to 1
        for caps in [vec![1.0], vec![3.0, 1.0], vec![0.5, 250.0, 1e6, 7.0]] {
            let records: Vec<MonthlyRecord> = caps.iter().map(|c| record(*c, 0.04)).collect();
            assert_relative_eq!(cap_weighted_return(&records), 0.04, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cap_weighted_missing_values() {
        // Missing cap: no weight. Missing return: contributes zero.
        let r = cap_weighted_return(&[
            record(100.0, f64::NAN),
            record(100.0, 0.1),
            record(f64::NAN, 0.5),
        ]);
        assert_relative_eq!(r, 0.05, epsilon = 1e-12);

        assert!(cap_weighted_return(&[]).is_nan());
        assert!(cap_weighted_return(&[record(0.0, 0.1)]).is_nan());
    }

    #[test]
    fn test_months_in_window() {
        assert_eq!(months_in_window(d(2020, 1, 31), d(2020, 2, 29)), vec![d(2020, 1, 1)]);
        assert_eq!(months_in_window(d(2020, 1, 15), d(2020, 1, 20)), vec![d(2020, 1, 1)]);
        assert_eq!(
            months_in_window(d(2020, 11, 30), d(2021, 2, 1)),
            vec![d(2020, 11, 1), d(2020, 12, 1), d(2021, 1, 1)]
        );
    }

    #[test]
    fn test_weighting_parse() {
        assert_eq!("equal".parse::<Weighting>().unwrap(), Weighting::Equal);
        assert_eq!("cap-weighted".parse::<Weighting>().unwrap(), Weighting::CapWeighted);
        assert!(matches!(
            "value".parse::<Weighting>().unwrap_err(),
            QuintilError::Configuration(_)
        ));
    }
}
