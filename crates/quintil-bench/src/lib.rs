//! Benchmark index prices for Quintil.
//!
//! Fetches daily closes of a benchmark index (e.g. `^NDX`) from a public
//! chart API and turns them into trailing one-year returns, the series
//! portfolio buckets are compared against.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quintil_bench::{BenchmarkClient, TRADING_DAYS_PER_YEAR};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BenchmarkClient::from_env()?;
//!     let rolling = client
//!         .rolling_returns("^NDX", start, end, TRADING_DAYS_PER_YEAR)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Environment Variables
//!
//! `QUINTIL_BENCHMARK_URL` points the client at another chart endpoint.

mod client;
mod error;
mod rolling;
mod types;

pub use client::{BENCHMARK_URL_ENV, BenchmarkClient};
pub use error::BenchError;
pub use rolling::{TRADING_DAYS_PER_YEAR, daily_returns, rolling_returns};
pub use types::*;

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;
