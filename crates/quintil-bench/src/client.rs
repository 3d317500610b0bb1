//! Chart API client implementation.

use crate::{
    Result,
    error::BenchError,
    rolling::{daily_returns, rolling_returns},
    types::ChartResponse,
};
use quintil_traits::{Date, PricePoint, ReturnSeries, date_to_epoch_days};
use reqwest::{Client, StatusCode};
use std::env;

/// Base URL of the public chart API.
const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Environment variable overriding the chart API base URL.
pub const BENCHMARK_URL_ENV: &str = "QUINTIL_BENCHMARK_URL";

const SECONDS_PER_DAY: i64 = 86_400;

/// Client for daily benchmark index prices.
#[derive(Debug, Clone)]
pub struct BenchmarkClient {
    client: Client,
    base_url: String,
}

impl BenchmarkClient {
    /// Create a client against the public chart API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_base_url(CHART_BASE_URL)
    }

    /// Create a client against another chart endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("quintil/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client, honouring `QUINTIL_BENCHMARK_URL` if set.
    ///
    /// This will also load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        match env::var(BENCHMARK_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(url.trim()),
            _ => Self::new(),
        }
    }

    /// URL of the daily chart of `symbol` over `[start, end)`.
    fn chart_url(&self, symbol: &str, start: Date, end: Date) -> String {
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            symbol.trim().replace('^', "%5E"),
            unix_seconds(start),
            unix_seconds(end)
        )
    }

    /// Make a GET request and parse the chart response.
    async fn get(&self, url: &str) -> Result<ChartResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BenchError::RateLimitExceeded);
        }

        let text = response.text().await?;
        if !status.is_success() {
            // Error bodies usually still carry a chart error object
            let detail = serde_json::from_str::<ChartResponse>(&text)
                .ok()
                .and_then(|r| r.chart.error)
                .map_or(text, |e| format!("{}: {}", e.code, e.description));
            return Err(BenchError::Api(format!("HTTP {status}: {detail}")));
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Daily closes of `symbol` over `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API reports an error, or
    /// no prices fall in the range.
    pub async fn daily_closes(
        &self,
        symbol: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<PricePoint>> {
        let response = self.get(&self.chart_url(symbol, start, end)).await?;
        let closes = parse_closes(symbol, response)?;
        tracing::debug!(symbol, points = closes.len(), "fetched benchmark closes");
        Ok(closes)
    }

    /// Trailing `window`-day compounded returns of `symbol` over `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the closes cannot be fetched.
    pub async fn rolling_returns(
        &self,
        symbol: &str,
        start: Date,
        end: Date,
        window: usize,
    ) -> Result<ReturnSeries> {
        let closes = self.daily_closes(symbol, start, end).await?;
        Ok(rolling_returns(&daily_returns(&closes), window))
    }
}

/// Extract the closes of `symbol` from a chart response.
fn parse_closes(symbol: &str, response: ChartResponse) -> Result<Vec<PricePoint>> {
    if let Some(error) = response.chart.error {
        return Err(BenchError::Api(format!(
            "{}: {}",
            error.code, error.description
        )));
    }
    let closes = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|result| result.closes())
        .unwrap_or_default();
    if closes.is_empty() {
        return Err(BenchError::NoData(symbol.to_string()));
    }
    Ok(closes)
}

fn unix_seconds(date: Date) -> i64 {
    i64::from(date_to_epoch_days(date)) * SECONDS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "^NDX", "currency": "USD", "regularMarketPrice": 100.0},
                "timestamp": [1577975400, 1578061800, 1578321000, 1578407400],
                "indicators": {
                    "quote": [{"close": [8872.2, 8793.9, null, 8848.5], "volume": [1, 2, 3, 4]}],
                    "adjclose": [{"adjclose": [8872.2, 8793.9, null, 8848.5]}]
                }
            }],
            "error": null
        }
    }"#;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_url_building() {
        let client = BenchmarkClient::with_base_url("http://localhost:9/chart/").unwrap();
        assert_eq!(
            client.chart_url("^NDX", d(2020, 1, 1), d(2020, 1, 2)),
            "http://localhost:9/chart/%5ENDX?period1=1577836800&period2=1577923200&interval=1d&events=history"
        );
    }

    #[test]
    fn test_parse_chart_response() {
        let response: ChartResponse = serde_json::from_str(CHART).unwrap();
        let closes = parse_closes("^NDX", response).unwrap();

        assert_eq!(closes.len(), 3);
        assert_eq!(closes[0].date, d(2020, 1, 2));
        assert_eq!(closes[2].date, d(2020, 1, 7));
        assert!((closes[1].close - 8793.9).abs() < 1e-9);
    }

    #[test]
    fn test_close_fallback_without_adjclose() {
        let json = r#"{"chart": {"result": [{
            "timestamp": [1577975400, 1578061800],
            "indicators": {"quote": [{"close": [10.0, 11.0]}]}
        }], "error": null}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        let closes = parse_closes("X", response).unwrap();
        assert_eq!(closes.len(), 2);
        assert!((closes[1].close - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_api_error_and_empty_result() {
        let json = r#"{"chart": {"result": null,
            "error": {"code": "Not Found", "description": "No data found"}}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(parse_closes("BAD", response), Err(BenchError::Api(_))));

        let json = r#"{"chart": {"result": [], "error": null}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(parse_closes("BAD", response), Err(BenchError::NoData(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let client = BenchmarkClient::with_base_url("http://127.0.0.1:1").unwrap();
        let err = client
            .daily_closes("^NDX", d(2020, 1, 1), d(2020, 2, 1))
            .await
            .unwrap_err();
        // A configured HTTP proxy may answer with an error status instead
        assert!(matches!(err, BenchError::Request(_) | BenchError::Api(_)));
    }
}
