//! Point-in-time market data loading for quintil.
//!
//! This crate reads the CSV extracts for each supported index and exposes
//! them through the [`DataSource`](quintil_traits::DataSource) trait:
//! - Membership: which tickers belonged to an index on a date
//! - Fundamentals: the latest public report per ticker as of a date
//! - Prices: daily closes per ticker in a half-open window
//! - Monthly: market cap and monthly return for cap weighting
//!
//! # Example
//!
//! ```ignore
//! use quintil_data::{DataLayout, IndexPreset, MarketData};
//! use quintil_traits::DataSource;
//!
//! let layout = DataLayout::from_env();
//! let market = MarketData::load(&layout, &IndexPreset::ALL)?;
//! let members = market.membership("nasdaq100", date)?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod frame;
pub mod fundamentals;
pub mod layout;
pub mod market;
pub mod membership;
pub mod monthly;
pub mod prices;

// Re-export key types
pub use fundamentals::FundamentalsTable;
pub use layout::{DATA_DIR_ENV, DataLayout, IndexPreset, MembershipKind, SourceSchema};
pub use market::{IndexData, MarketData};
pub use membership::{Membership, MembershipRange};
pub use monthly::MonthlyTable;
pub use prices::PriceTable;
