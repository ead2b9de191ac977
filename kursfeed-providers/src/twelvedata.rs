//! Twelve Data adapter (`api.twelvedata.com`), fallback priority 1.
//!
//! Every numeric field in Twelve Data's JSON is string-typed. Errors are
//! reported in-band as `{ "code": <http-ish code>, "status": "error" }`
//! bodies on an HTTP 200.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use kursfeed_core::{FeedError, Period, ProviderConnector, ProviderId, Quote, SeriesPoint};
use serde_json::Value;
use tracing::debug;

use crate::http::{get_json, opt_f64, opt_str, opt_u64};

const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

/// Twelve Data connector.
pub struct TwelveData {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TwelveData {
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

    /// Connector keyed from the `TWELVE_DATA_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, FeedError> {
        let key = std::env::var("TWELVE_DATA_API_KEY")
            .map_err(|_| FeedError::InvalidArg("TWELVE_DATA_API_KEY not set".into()))?;
        Ok(Self::new(key))
    }

    /// Twelve Data reports failures as `{code, status: "error"}` bodies.
    fn check_error_body(&self, symbol: &str, body: &Value) -> Result<(), FeedError> {
        if body.get("status").and_then(Value::as_str) != Some("error") {
            return Ok(());
        }
        let code = body.get("code").and_then(Value::as_i64).unwrap_or(0);
        let msg = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        debug!(target: "kursfeed::providers", provider = %self.id(), symbol, code, msg, "vendor error body");
        match code {
            429 => Err(FeedError::RateLimited { provider: self.id() }),
            400 | 404 => Err(FeedError::not_found(format!("quote for {symbol}"))),
            _ => Err(FeedError::transient(self.id(), msg.to_string())),
        }
    }
}

#[async_trait]
impl ProviderConnector for TwelveData {
    fn id(&self) -> ProviderId {
        ProviderId::TwelveData
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, FeedError> {
        let url = format!("{}/quote", self.base_url);
        let body = get_json(
            &self.client,
            self.id(),
            &url,
            &[("symbol", symbol), ("apikey", &self.api_key)],
        )
        .await?;
        self.check_error_body(symbol, &body)?;

        let price = opt_f64(body.get("close"));
        if price.is_none() {
            return Err(FeedError::not_found(format!("quote for {symbol}")));
        }

        let quote = Quote {
            ticker: symbol.to_string(),
            company_name: opt_str(body.get("name")),
            price,
            change: opt_f64(body.get("change")),
            change_percent: opt_f64(body.get("percent_change")),
            market_cap: None,
            pe_ratio: None,
            dividend_yield: None,
            sector: None,
            industry: None,
            volume: opt_u64(body.get("volume")),
            source: self.id(),
            fetched_at: Utc::now(),
        };
        quote.validate()?;
        Ok(quote)
    }

    async fn history(&self, symbol: &str, period: Period) -> Result<Vec<SeriesPoint>, FeedError> {
        let url = format!("{}/time_series", self.base_url);
        let outputsize = period.approx_days().to_string();
        let body = get_json(
            &self.client,
            self.id(),
            &url,
            &[
                ("symbol", symbol),
                ("interval", "1day"),
                ("outputsize", &outputsize),
                ("apikey", &self.api_key),
            ],
        )
        .await?;
        self.check_error_body(symbol, &body)?;

        let values = body
            .get("values")
            .and_then(Value::as_array)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FeedError::not_found(format!("history for {symbol}")))?;

        // Values arrive newest-first; ordering is restored downstream.
        let mut points = Vec::with_capacity(values.len());
        for item in values {
            let Some(date) = item
                .get("datetime")
                .and_then(Value::as_str)
                .and_then(parse_day)
            else {
                continue;
            };
            let Some(close) = opt_f64(item.get("close")) else {
                continue;
            };
            points.push(SeriesPoint {
                date,
                close,
                volume: opt_u64(item.get("volume")),
            });
        }
        if points.is_empty() {
            return Err(FeedError::transient(
                self.id(),
                format!("no parsable history rows for {symbol}"),
            ));
        }
        Ok(points)
    }
}

/// Daily rows carry `YYYY-MM-DD`, intraday-flavored responses append a time.
fn parse_day(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
