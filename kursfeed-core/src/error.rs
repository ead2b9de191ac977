use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connector::ProviderId;

/// Unified error type for the kursfeed workspace.
///
/// Provider-level failures (`RateLimited`, `NotFound`, `Transient`,
/// `Timeout`, `QuotaExhausted`) are collected by the orchestrator and only
/// surfaced to callers as one of the aggregate variants (`UnknownTicker`,
/// `AllProvidersRateLimited`, `ProviderUnavailable`, `AllProvidersFailed`)
/// once the stale-cache fallback has also come up empty.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq)]
#[non_exhaustive]
pub enum FeedError {
    /// The ticker contains characters outside the allowed charset `[A-Z0-9.\-]`.
    #[error("unsupported ticker format: {ticker}")]
    UnsupportedTickerFormat {
        /// The offending ticker as given by the caller.
        ticker: String,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with returned or expected data (missing fields, bad values, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// The requested operation is not implemented by the target provider.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// A capability string describing what was requested (e.g. "history").
        capability: String,
    },

    /// A resource or symbol could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "quote for AAPL".
        what: String,
    },

    /// A provider rejected the call with HTTP 429 or a vendor quota payload.
    #[error("{provider} rate limited")]
    RateLimited {
        /// Provider that rejected the call.
        provider: ProviderId,
    },

    /// The local quota budget for a provider is exhausted; no network call was made.
    #[error("{provider} quota exhausted: reset_in_ms={reset_in_ms}")]
    QuotaExhausted {
        /// Provider whose window is full.
        provider: ProviderId,
        /// Milliseconds until the quota window resets.
        reset_in_ms: u64,
    },

    /// Transient provider failure: 5xx, connection error, or malformed payload.
    #[error("{provider} transient failure: {msg}")]
    Transient {
        /// Provider that failed.
        provider: ProviderId,
        /// Human-readable failure message.
        msg: String,
    },

    /// An individual provider call exceeded the configured timeout.
    #[error("{provider} timed out")]
    Timeout {
        /// Provider that timed out.
        provider: ProviderId,
    },

    /// Every attempted provider reported the ticker as unknown.
    #[error("unknown ticker: {ticker}")]
    UnknownTicker {
        /// The canonical ticker that no provider recognized.
        ticker: String,
    },

    /// Every attempted provider is currently rate- or quota-limited.
    #[error("all providers rate limited")]
    AllProvidersRateLimited,

    /// Every attempted provider failed transiently and no cache entry exists.
    #[error("no provider available for {ticker}")]
    ProviderUnavailable {
        /// The canonical ticker of the failed lookup.
        ticker: String,
    },

    /// Mixed failures across providers with no cache to fall back on.
    #[error("all providers failed: {0:?}")]
    AllProvidersFailed(Vec<FeedError>),
}

impl FeedError {
    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Transient` error tagged with the failing provider.
    pub fn transient(provider: ProviderId, msg: impl Into<String>) -> Self {
        Self::Transient {
            provider,
            msg: msg.into(),
        }
    }

    /// Flatten nested `AllProvidersFailed` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllProvidersFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

/// Collapse the per-provider failures of one lookup into the error surfaced
/// to the caller.
///
/// Classification: every provider said not-found → `UnknownTicker`; every
/// provider was rate- or quota-limited → `AllProvidersRateLimited`; every
/// provider failed transiently (including timeouts) → `ProviderUnavailable`;
/// anything mixed → `AllProvidersFailed` carrying the individual errors.
#[must_use]
pub fn collapse_errors(ticker: &str, errors: Vec<FeedError>) -> FeedError {
    if errors.is_empty() {
        return FeedError::ProviderUnavailable {
            ticker: ticker.to_string(),
        };
    }
    if errors
        .iter()
        .all(|e| matches!(e, FeedError::NotFound { .. }))
    {
        return FeedError::UnknownTicker {
            ticker: ticker.to_string(),
        };
    }
    if errors.iter().all(|e| {
        matches!(
            e,
            FeedError::RateLimited { .. } | FeedError::QuotaExhausted { .. }
        )
    }) {
        return FeedError::AllProvidersRateLimited;
    }
    if errors.iter().all(|e| {
        matches!(
            e,
            FeedError::Transient { .. } | FeedError::Timeout { .. }
        )
    }) {
        return FeedError::ProviderUnavailable {
            ticker: ticker.to_string(),
        };
    }
    FeedError::AllProvidersFailed(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_not_found_collapses_to_unknown_ticker() {
        let errs = vec![
            FeedError::not_found("quote for FOO"),
            FeedError::not_found("quote for FOO"),
        ];
        assert_eq!(
            collapse_errors("FOO", errs),
            FeedError::UnknownTicker {
                ticker: "FOO".into()
            }
        );
    }

    #[test]
    fn all_limited_collapses_to_rate_limited() {
        let errs = vec![
            FeedError::RateLimited {
                provider: ProviderId::TwelveData,
            },
            FeedError::QuotaExhausted {
                provider: ProviderId::Finnhub,
                reset_in_ms: 1000,
            },
        ];
        assert_eq!(collapse_errors("AAPL", errs), FeedError::AllProvidersRateLimited);
    }

    #[test]
    fn mixed_failures_keep_individual_errors() {
        let errs = vec![
            FeedError::not_found("quote for AAPL"),
            FeedError::transient(ProviderId::Finnhub, "boom"),
        ];
        match collapse_errors("AAPL", errs.clone()) {
            FeedError::AllProvidersFailed(inner) => assert_eq!(inner, errs),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn flatten_unwraps_nested_aggregates() {
        let nested = FeedError::AllProvidersFailed(vec![
            FeedError::not_found("x"),
            FeedError::AllProvidersFailed(vec![FeedError::Timeout {
                provider: ProviderId::AlphaVantage,
            }]),
        ]);
        assert_eq!(nested.flatten().len(), 2);
    }
}
