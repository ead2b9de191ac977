//! Alpha Vantage adapter (`alphavantage.co`), fallback priority 3.
//!
//! Quirks handled here: positional field keys (`"05. price"`), percent
//! values as suffixed strings (`"1.23%"`), the literal string `"None"` for
//! absent fundamentals, and quota exhaustion reported as an HTTP 200 whose
//! body carries a `Note` or `Information` key instead of data.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use kursfeed_core::{FeedError, Period, ProviderConnector, ProviderId, Quote, SeriesPoint};
use serde_json::Value;
use tracing::debug;

use crate::http::{get_json, opt_f64, opt_str, opt_u64};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Alpha Vantage connector.
pub struct AlphaVantage {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantage {
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

    /// Connector keyed from the `ALPHA_VANTAGE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, FeedError> {
        let key = std::env::var("ALPHA_VANTAGE_API_KEY")
            .map_err(|_| FeedError::InvalidArg("ALPHA_VANTAGE_API_KEY not set".into()))?;
        Ok(Self::new(key))
    }

    async fn query(&self, function: &str, symbol: &str, extra: &[(&str, &str)]) -> Result<Value, FeedError> {
        let url = format!("{}/query", self.base_url);
        let mut params = vec![
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];
        params.extend_from_slice(extra);
        let body = get_json(&self.client, self.id(), &url, &params).await?;
        self.check_quota_body(&body)?;
        Ok(body)
    }

    /// A `Note` or `Information` body on HTTP 200 means the daily quota ran out.
    fn check_quota_body(&self, body: &Value) -> Result<(), FeedError> {
        if body.get("Note").is_some() || body.get("Information").is_some() {
            return Err(FeedError::RateLimited { provider: self.id() });
        }
        Ok(())
    }

    /// Best-effort company fundamentals. Any failure degrades to `None`.
    async fn overview(&self, symbol: &str) -> Option<Value> {
        match self.query("OVERVIEW", symbol, &[]).await {
            Ok(body) if body.get("Symbol").is_some() => Some(body),
            Ok(_) => None,
            Err(err) => {
                debug!(target: "kursfeed::providers", provider = %self.id(), symbol, %err, "overview lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl ProviderConnector for AlphaVantage {
    fn id(&self) -> ProviderId {
        ProviderId::AlphaVantage
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, FeedError> {
        let body = self.query("GLOBAL_QUOTE", symbol, &[]).await?;
        let global = body
            .get("Global Quote")
            .and_then(Value::as_object)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| FeedError::not_found(format!("quote for {symbol}")))?;

        let mut quote = Quote {
            ticker: symbol.to_string(),
            company_name: None,
            price: opt_f64(global.get("05. price")),
            change: opt_f64(global.get("09. change")),
            change_percent: opt_f64(global.get("10. change percent")),
            market_cap: None,
            pe_ratio: None,
            dividend_yield: None,
            sector: None,
            industry: None,
            volume: opt_u64(global.get("06. volume")),
            source: self.id(),
            fetched_at: Utc::now(),
        };
        if quote.price.is_none() {
            return Err(FeedError::not_found(format!("quote for {symbol}")));
        }

        if let Some(overview) = self.overview(symbol).await {
            quote.company_name = opt_str(overview.get("Name"));
            quote.sector = opt_str(overview.get("Sector"));
            quote.industry = opt_str(overview.get("Industry"));
            quote.market_cap = opt_f64(overview.get("MarketCapitalization"));
            quote.pe_ratio = opt_f64(overview.get("PERatio"));
            quote.dividend_yield = opt_f64(overview.get("DividendYield"));
        }

        quote.validate()?;
        Ok(quote)
    }

    async fn history(&self, symbol: &str, period: Period) -> Result<Vec<SeriesPoint>, FeedError> {
        // compact covers 100 days; anything longer needs the full dump.
        let outputsize = if period.approx_days() > 100 { "full" } else { "compact" };
        let body = self
            .query("TIME_SERIES_DAILY", symbol, &[("outputsize", outputsize)])
            .await?;

        let series = body
            .get("Time Series (Daily)")
            .and_then(Value::as_object)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| FeedError::not_found(format!("history for {symbol}")))?;

        let mut points: Vec<SeriesPoint> = series
            .iter()
            .filter_map(|(date, row)| {
                let date: NaiveDate = date.parse().ok()?;
                let close = opt_f64(row.get("4. close"))?;
                Some(SeriesPoint {
                    date,
                    close,
                    volume: opt_u64(row.get("5. volume")),
                })
            })
            .collect();
        if points.is_empty() {
            return Err(FeedError::transient(
                self.id(),
                format!("no parsable history rows for {symbol}"),
            ));
        }

        // The full dump spans decades; keep only the newest span the caller asked for.
        points.sort_by_key(|p| p.date);
        let keep = period.approx_days();
        if points.len() > keep {
            points.drain(..points.len() - keep);
        }
        Ok(points)
    }
}
