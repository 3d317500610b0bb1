//! Monthly market capitalization and returns, used for cap weighting.

use crate::frame::{date_column, f64_column, string_column};
use polars::prelude::DataFrame;
use quintil_traits::{Date, MonthlyRecord, Result, Ticker, month_start};
use std::collections::HashMap;

/// Monthly records keyed by (ticker, first day of month).
#[derive(Debug, Clone, Default)]
pub struct MonthlyTable {
    records: HashMap<(Ticker, Date), MonthlyRecord>,
}

impl MonthlyTable {
    /// Build the table from a (date, ticker, market cap, monthly return) frame.
    ///
    /// Any date within a month identifies that month.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or has an unusable type.
    pub fn from_frame(
        df: &DataFrame,
        date_col: &str,
        ticker_col: &str,
        cap_col: &str,
        return_col: &str,
    ) -> Result<Self> {
        let dates = date_column(df, date_col)?;
        let tickers = string_column(df, ticker_col)?;
        let caps = f64_column(df, cap_col)?;
        let returns = f64_column(df, return_col)?;

        let mut records = HashMap::with_capacity(tickers.len());
        for (((date, ticker), market_cap), monthly_return) in
            dates.into_iter().zip(tickers).zip(caps).zip(returns)
        {
            let (Some(date), Some(ticker)) = (date, ticker) else {
                continue;
            };
            let month = month_start(date);
            records.insert(
                (ticker.clone(), month),
                MonthlyRecord {
                    ticker,
                    month,
                    market_cap,
                    monthly_return,
                },
            );
        }

        Ok(Self { records })
    }

    /// Record for `ticker` in the month containing `month`.
    pub fn get(&self, ticker: &str, month: Date) -> Option<&MonthlyRecord> {
        self.records.get(&(ticker.to_string(), month_start(month)))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_lookup_by_any_day_in_month() {
        let df = df! {
            "date" => &["2020-01-31", "2020-02-28"],
            "Ticker" => &["AAPL", "AAPL"],
            "MthCap" => &[Some(1.2e12), None],
            "MthRetx" => &[0.054, -0.114],
        }
        .unwrap();

        let table = MonthlyTable::from_frame(&df, "date", "Ticker", "MthCap", "MthRetx").unwrap();
        assert_eq!(table.len(), 2);

        let jan = table
            .get("AAPL", Date::from_ymd_opt(2020, 1, 1).unwrap())
            .unwrap();
        assert_eq!(jan.market_cap, 1.2e12);
        assert_eq!(jan.month, Date::from_ymd_opt(2020, 1, 1).unwrap());

        let feb = table
            .get("AAPL", Date::from_ymd_opt(2020, 2, 15).unwrap())
            .unwrap();
        assert!(feb.market_cap.is_nan());

        assert!(table.get("MSFT", Date::from_ymd_opt(2020, 1, 1).unwrap()).is_none());
    }
}
