use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FeedError;
use crate::types::{Period, Quote, SeriesPoint};

/// Identity of a market-data vendor.
///
/// The vendor set is closed: quota defaults, ticker-format rules, and the
/// fallback priority are all keyed off this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// Twelve Data (`api.twelvedata.com`), fallback priority 1.
    TwelveData,
    /// Finnhub (`finnhub.io`), fallback priority 2.
    Finnhub,
    /// Alpha Vantage (`alphavantage.co`), fallback priority 3.
    AlphaVantage,
}

impl ProviderId {
    /// Stable snake_case label used in logs and cache attribution.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TwelveData => "twelve_data",
            Self::Finnhub => "finnhub",
            Self::AlphaVantage => "alpha_vantage",
        }
    }

}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract implemented by every vendor adapter.
///
/// Symbols arrive already converted to the vendor's expected format (see
/// [`crate::symbol::to_provider_format`]); adapters never re-map tickers.
/// Adapters translate every failure into a [`FeedError`] variant and never
/// panic across this boundary.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// This adapter's vendor identity.
    fn id(&self) -> ProviderId;

    /// Whether the vendor exposes a daily-history endpoint. Vendors without
    /// one are skipped by history lookups before any quota is consumed.
    fn supports_history(&self) -> bool {
        true
    }

    /// Fetch a quote for `symbol`.
    ///
    /// May issue a second, best-effort company-profile request to fill the
    /// fundamental fields; a profile failure degrades those fields to `None`
    /// instead of failing the quote. One quota admission covers the whole
    /// lookup attempt.
    async fn quote(&self, symbol: &str) -> Result<Quote, FeedError>;

    /// Fetch daily closes covering `period`, in no guaranteed order.
    /// Implementations for which [`supports_history`](Self::supports_history)
    /// is false return [`FeedError::Unsupported`].
    async fn history(&self, symbol: &str, period: Period) -> Result<Vec<SeriesPoint>, FeedError>;
}
