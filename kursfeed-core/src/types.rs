use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::connector::ProviderId;
use crate::error::FeedError;

/// A normalized point-in-time quote for one instrument.
///
/// Every market field is optional: a vendor that does not report a field
/// leaves it `None`. Absence is never encoded as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Canonical ticker, e.g. `AAPL` or `SAP.DE`.
    pub ticker: String,
    /// Company name, when the vendor reports one.
    pub company_name: Option<String>,
    /// Last traded price.
    pub price: Option<f64>,
    /// Absolute change versus the previous close.
    pub change: Option<f64>,
    /// Percent change versus the previous close.
    pub change_percent: Option<f64>,
    /// Market capitalization in raw currency units (not millions).
    pub market_cap: Option<f64>,
    /// Trailing price/earnings ratio.
    pub pe_ratio: Option<f64>,
    /// Dividend yield as a percentage.
    pub dividend_yield: Option<f64>,
    /// Sector classification.
    pub sector: Option<String>,
    /// Industry classification.
    pub industry: Option<String>,
    /// Most recent daily volume.
    pub volume: Option<u64>,
    /// Provider that produced this quote.
    pub source: ProviderId,
    /// When the quote was fetched from the provider.
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    /// An empty quote skeleton for the given ticker and source, stamped now.
    #[must_use]
    pub fn empty(ticker: impl Into<String>, source: ProviderId) -> Self {
        Self {
            ticker: ticker.into(),
            company_name: None,
            price: None,
            change: None,
            change_percent: None,
            market_cap: None,
            pe_ratio: None,
            dividend_yield: None,
            sector: None,
            industry: None,
            volume: None,
            source,
            fetched_at: Utc::now(),
        }
    }

    /// Reject quotes that violate the canonical invariants.
    ///
    /// A present `price` must be non-negative. `None` fields are always valid.
    pub fn validate(&self) -> Result<(), FeedError> {
        if let Some(p) = self.price
            && p < 0.0
        {
            return Err(FeedError::Data(format!(
                "negative price {p} for {}",
                self.ticker
            )));
        }
        Ok(())
    }
}

/// One raw daily sample as reported by a provider, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Trading day.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
    /// Daily volume, if reported.
    pub volume: Option<u64>,
}

/// One canonical history sample: a [`SeriesPoint`] plus the percent change
/// relative to the first close of the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Trading day.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
    /// Daily volume, if reported.
    pub volume: Option<u64>,
    /// Percent change versus the first close of the series. `0.0` for the
    /// first point, and for every point when the first close is non-positive.
    pub normalized_change_pct: f64,
}

/// Supported history lookback periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// One month.
    M1,
    /// Three months.
    M3,
    /// Six months.
    M6,
    /// One year.
    Y1,
    /// Two years.
    Y2,
    /// Five years.
    Y5,
}

impl Period {
    /// Approximate number of trading-calendar days covered by the period.
    /// Used to size provider requests and truncate oversized responses.
    #[must_use]
    pub const fn approx_days(self) -> usize {
        match self {
            Self::M1 => 30,
            Self::M3 => 90,
            Self::M6 => 180,
            Self::Y1 => 365,
            Self::Y2 => 730,
            Self::Y5 => 1825,
        }
    }

    /// The wire label, e.g. `1mo` or `5y`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1mo",
            Self::M3 => "3mo",
            Self::M6 => "6mo",
            Self::Y1 => "1y",
            Self::Y2 => "2y",
            Self::Y5 => "5y",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1mo" => Ok(Self::M1),
            "3mo" => Ok(Self::M3),
            "6mo" => Ok(Self::M6),
            "1y" => Ok(Self::Y1),
            "2y" => Ok(Self::Y2),
            "5y" => Ok(Self::Y5),
            other => Err(FeedError::InvalidArg(format!("unknown period: {other}"))),
        }
    }
}

/// Cache category. Each category carries its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Quote and company data.
    Info,
    /// Daily price history.
    History,
    /// Derived analysis artifacts cached by the host application.
    Analysis,
}

impl Category {
    /// Default TTL for the category: 1 h for quotes, 24 h for history,
    /// 6 h for analysis artifacts.
    #[must_use]
    pub const fn default_ttl(self) -> Duration {
        match self {
            Self::Info => Duration::from_secs(60 * 60),
            Self::History => Duration::from_secs(24 * 60 * 60),
            Self::Analysis => Duration::from_secs(6 * 60 * 60),
        }
    }

    /// The category label used in logs and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::History => "history",
            Self::Analysis => "analysis",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful lookup result with provenance.
///
/// `stale: true` means every provider failed and the value was served from
/// an expired cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    /// The payload.
    pub value: T,
    /// Provider that originally produced the payload.
    pub source: ProviderId,
    /// Whether the payload came from an expired cache entry.
    pub stale: bool,
}
