//! Daily and rolling returns of a price history.

use quintil_traits::{PricePoint, ReturnPoint, ReturnSeries};

/// Trading days in a year, the default rolling window.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Simple daily returns of consecutive closes.
///
/// The first close has no predecessor and produces no point.
pub fn daily_returns(closes: &[PricePoint]) -> ReturnSeries {
    closes
        .windows(2)
        .map(|pair| ReturnPoint {
            date: pair[1].date,
            value: pair[1].close / pair[0].close - 1.0,
        })
        .filter(|p| p.value.is_finite())
        .collect()
}

/// Compounded return over each trailing window of `window` observations,
/// dated at the window's last observation.
///
/// Empty when the series is shorter than the window or `window` is zero.
pub fn rolling_returns(returns: &ReturnSeries, window: usize) -> ReturnSeries {
    if window == 0 {
        return ReturnSeries::new();
    }
    returns
        .points()
        .windows(window)
        .filter_map(|w| {
            let last = w.last()?;
            let growth: f64 = w.iter().map(|p| 1.0 + p.value).product();
            Some(ReturnPoint {
                date: last.date,
                value: growth - 1.0,
            })
        })
        .collect()
}
