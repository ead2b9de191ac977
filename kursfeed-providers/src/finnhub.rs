//! Finnhub adapter (`finnhub.io/api/v1`), fallback priority 2.
//!
//! The quote endpoint uses a compact single-letter schema (`c` close,
//! `d` change, `dp` change percent, `pc` previous close) and reports an
//! unknown symbol as an all-zero body rather than an HTTP error. Finnhub's
//! free tier has no daily-history endpoint.

use async_trait::async_trait;
use chrono::Utc;
use kursfeed_core::{FeedError, Period, ProviderConnector, ProviderId, Quote, SeriesPoint};
use serde_json::Value;
use tracing::debug;

use crate::http::{get_json, opt_f64, opt_str};

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub connector.
pub struct Finnhub {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl Finnhub {
    /// Connector with the production base URL.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Connector against an alternate base URL (HTTP-mock tests).
    #[must_use]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Connector keyed from the `FINNHUB_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, FeedError> {
        let key = std::env::var("FINNHUB_API_KEY")
            .map_err(|_| FeedError::InvalidArg("FINNHUB_API_KEY not set".into()))?;
        Ok(Self::new(key))
    }

    /// Best-effort company profile. Any failure degrades to `None`; a broken
    /// profile endpoint must not fail the quote.
    async fn profile(&self, symbol: &str) -> Option<Value> {
        let url = format!("{}/stock/profile2", self.base_url);
        match get_json(
            &self.client,
            self.id(),
            &url,
            &[("symbol", symbol), ("token", &self.api_key)],
        )
        .await
        {
            Ok(body) if body.get("name").and_then(Value::as_str).is_some() => Some(body),
            Ok(_) => None,
            Err(err) => {
                debug!(target: "kursfeed::providers", provider = %self.id(), symbol, %err, "profile lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl ProviderConnector for Finnhub {
    fn id(&self) -> ProviderId {
        ProviderId::Finnhub
    }

    fn supports_history(&self) -> bool {
        false
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, FeedError> {
        let url = format!("{}/quote", self.base_url);
        let body = get_json(
            &self.client,
            self.id(),
            &url,
            &[("symbol", symbol), ("token", &self.api_key)],
        )
        .await?;

        // An unknown symbol comes back as an all-zero quote.
        let price = opt_f64(body.get("c")).filter(|c| *c != 0.0);
        let Some(price) = price else {
            return Err(FeedError::not_found(format!("quote for {symbol}")));
        };

        let mut quote = Quote {
            ticker: symbol.to_string(),
            company_name: None,
            price: Some(price),
            change: opt_f64(body.get("d")),
            change_percent: opt_f64(body.get("dp")),
            market_cap: None,
            pe_ratio: None,
            dividend_yield: None,
            sector: None,
            industry: None,
            volume: None,
            source: self.id(),
            fetched_at: Utc::now(),
        };

        if let Some(profile) = self.profile(symbol).await {
            quote.company_name = opt_str(profile.get("name"));
            quote.sector = opt_str(profile.get("finnhubIndustry"));
            // Finnhub reports market cap in millions.
            quote.market_cap = opt_f64(profile.get("marketCapitalization")).map(|m| m * 1e6);
        }

        quote.validate()?;
        Ok(quote)
    }

    async fn history(&self, _symbol: &str, _period: Period) -> Result<Vec<SeriesPoint>, FeedError> {
        Err(FeedError::unsupported("history"))
    }
}
