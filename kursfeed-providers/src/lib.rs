//! kursfeed-providers
//!
//! Vendor HTTP adapters implementing the `ProviderConnector` contract:
//! Twelve Data, Finnhub, and Alpha Vantage. Each adapter maps its vendor's
//! wire schema into the canonical model and its failures (HTTP errors,
//! in-band error bodies, quota notes) into the shared `FeedError` taxonomy.
//!
//! Adapters expect symbols already in provider format; the orchestrator
//! applies the ticker mapping before calling in.
#![warn(missing_docs)]

mod http;

/// Alpha Vantage connector.
pub mod alphavantage;
/// Finnhub connector.
pub mod finnhub;
/// Twelve Data connector.
pub mod twelvedata;

pub use alphavantage::AlphaVantage;
pub use finnhub::Finnhub;
pub use twelvedata::TwelveData;
