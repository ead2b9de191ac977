//! Typed configuration for quotas, caching, and the fallback loop.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connector::ProviderId;
use crate::types::Category;

/// Fixed-window call budget for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Calls admitted per window.
    pub limit: u32,
    /// Window duration.
    pub window: Duration,
}

impl QuotaConfig {
    /// Free-tier default budget for `provider`: Twelve Data 8/min,
    /// Finnhub 60/min, Alpha Vantage 25/day.
    #[must_use]
    pub const fn for_provider(provider: ProviderId) -> Self {
        match provider {
            ProviderId::TwelveData => Self {
                limit: 8,
                window: Duration::from_secs(60),
            },
            ProviderId::Finnhub => Self {
                limit: 60,
                window: Duration::from_secs(60),
            },
            ProviderId::AlphaVantage => Self {
                limit: 25,
                window: Duration::from_secs(24 * 60 * 60),
            },
        }
    }
}

/// Per-category cache TTLs.
///
/// Categories without an override use [`Category::default_ttl`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL overrides keyed by category.
    pub ttl_overrides: HashMap<Category, Duration>,
}

impl CacheConfig {
    /// Effective TTL for `category`.
    #[must_use]
    pub fn ttl_for(&self, category: Category) -> Duration {
        self.ttl_overrides
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.default_ttl())
    }

    /// Override the TTL for one category.
    #[must_use]
    pub fn with_ttl(mut self, category: Category, ttl: Duration) -> Self {
        self.ttl_overrides.insert(category, ttl);
        self
    }
}

/// Top-level tuning knobs for the fetch pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Upper bound on a single provider attempt, enforced with
    /// `tokio::time::timeout` in addition to the HTTP client timeout.
    pub provider_timeout: Duration,
    /// Quota overrides keyed by provider; providers without an entry use
    /// [`QuotaConfig::for_provider`].
    pub quota_overrides: HashMap<ProviderId, QuotaConfig>,
    /// Cache TTL configuration.
    pub cache: CacheConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(8),
            quota_overrides: HashMap::new(),
            cache: CacheConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Effective quota budget for `provider`.
    #[must_use]
    pub fn quota_for(&self, provider: ProviderId) -> QuotaConfig {
        self.quota_overrides
            .get(&provider)
            .copied()
            .unwrap_or_else(|| QuotaConfig::for_provider(provider))
    }
}
