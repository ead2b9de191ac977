//! The fallback orchestrator: cache check, quota-gated provider iteration,
//! stale fallback, and failure classification.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use kursfeed_core::error::collapse_errors;
use kursfeed_core::{
    CacheConfig, Category, Clock, FeedConfig, FeedError, Fetched, HistoryPoint, Period,
    ProviderConnector, ProviderId, Quote, QuotaConfig, SystemClock, symbol, timeseries,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CachePayload, CacheStore};
use crate::quota::{QuotaState, QuotaTracker};

/// Builder for [`Kursfeed`]. Providers are tried in registration order;
/// register the most trusted vendor first.
pub struct KursfeedBuilder {
    providers: Vec<Arc<dyn ProviderConnector>>,
    cfg: FeedConfig,
    clock: Arc<dyn Clock>,
}

impl Default for KursfeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KursfeedBuilder {
    /// A builder with default config and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            cfg: FeedConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Register a provider. Registration order is fallback priority.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ProviderConnector>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Override the per-attempt timeout (default 8 s).
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Override one provider's quota budget.
    #[must_use]
    pub fn quota(mut self, provider: ProviderId, quota: QuotaConfig) -> Self {
        self.cfg.quota_overrides.insert(provider, quota);
        self
    }

    /// Override one cache category's TTL.
    #[must_use]
    pub fn cache_ttl(mut self, category: Category, ttl: Duration) -> Self {
        self.cfg.cache.ttl_overrides.insert(category, ttl);
        self
    }

    /// Replace the whole cache configuration.
    #[must_use]
    pub fn cache_config(mut self, cache: CacheConfig) -> Self {
        self.cfg.cache = cache;
        self
    }

    /// Drive quota windows and cache TTLs from an injected clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// [`FeedError::InvalidArg`] when no provider is registered or two
    /// providers share a [`ProviderId`].
    pub fn build(self) -> Result<Kursfeed, FeedError> {
        if self.providers.is_empty() {
            return Err(FeedError::InvalidArg(
                "at least one provider is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for p in &self.providers {
            if !seen.insert(p.id()) {
                return Err(FeedError::InvalidArg(format!(
                    "duplicate provider: {}",
                    p.id()
                )));
            }
        }

        let quota = QuotaTracker::new(self.clock.clone());
        for p in &self.providers {
            quota.register(p.id(), self.cfg.quota_for(p.id()));
        }
        let cache = CacheStore::new(self.clock.clone(), self.cfg.cache.clone());

        Ok(Kursfeed {
            providers: self.providers,
            quota,
            cache,
            cfg: self.cfg,
        })
    }
}

/// Quota-aware, cache-backed market-data fetcher with deterministic
/// sequential provider fallback.
pub struct Kursfeed {
    providers: Vec<Arc<dyn ProviderConnector>>,
    quota: QuotaTracker,
    cache: CacheStore,
    cfg: FeedConfig,
}

impl Kursfeed {
    /// Start building a new instance.
    #[must_use]
    pub fn builder() -> KursfeedBuilder {
        KursfeedBuilder::new()
    }

    async fn call_with_timeout<T, Fut>(
        provider: ProviderId,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, FeedError>
    where
        Fut: Future<Output = Result<T, FeedError>>,
    {
        (tokio::time::timeout(timeout, fut).await)
            .unwrap_or_else(|_| Err(FeedError::Timeout { provider }))
    }

    /// Fetch a quote for `ticker`.
    ///
    /// Cache-first (`info` category, fresh only), then providers in priority
    /// order, each gated by its quota window and the per-attempt timeout.
    /// When every provider fails, an expired cache entry is served with
    /// `stale: true` before any error surfaces.
    ///
    /// # Errors
    /// [`FeedError::UnsupportedTickerFormat`] for an invalid ticker; one of
    /// the aggregate variants (`UnknownTicker`, `AllProvidersRateLimited`,
    /// `ProviderUnavailable`, `AllProvidersFailed`) on total exhaustion.
    pub async fn quote(&self, ticker: &str) -> Result<Fetched<Quote>, FeedError> {
        let canonical = symbol::canonicalize(ticker)?;

        if let Some((CachePayload::Quote(q), source)) = self.cache.get(&canonical, Category::Info) {
            debug!(target: "kursfeed", ticker = %canonical, %source, "quote cache hit");
            return Ok(Fetched {
                value: q,
                source,
                stale: false,
            });
        }

        let mut errors: Vec<FeedError> = Vec::new();
        for provider in &self.providers {
            let id = provider.id();
            if let Err(e) = self.quota.try_acquire(id) {
                debug!(target: "kursfeed", ticker = %canonical, provider = %id, "quota skip");
                errors.push(e);
                continue;
            }
            let symbol = symbol::to_provider_format(&canonical, id)?;
            match Self::call_with_timeout(id, self.cfg.provider_timeout, provider.quote(&symbol))
                .await
            {
                Ok(mut quote) => {
                    quote.ticker = canonical.clone();
                    quote.source = id;
                    self.cache.set(
                        &canonical,
                        Category::Info,
                        CachePayload::Quote(quote.clone()),
                        id,
                    );
                    info!(target: "kursfeed", ticker = %canonical, provider = %id, "quote fetched");
                    return Ok(Fetched {
                        value: quote,
                        source: id,
                        stale: false,
                    });
                }
                Err(e) => {
                    self.quota.record_failure(id);
                    warn!(target: "kursfeed", ticker = %canonical, provider = %id, error = %e, "quote attempt failed");
                    errors.push(e);
                }
            }
        }

        if let Some((CachePayload::Quote(q), source)) =
            self.cache.get_stale(&canonical, Category::Info)
        {
            warn!(target: "kursfeed", ticker = %canonical, %source, "all providers failed, serving stale quote");
            return Ok(Fetched {
                value: q,
                source,
                stale: true,
            });
        }

        Err(collapse_errors(&canonical, errors))
    }

    /// Fetch normalized daily history for `ticker` over `period`.
    ///
    /// Same pipeline as [`quote`](Self::quote) with the `history` category,
    /// plus a capability gate: providers without history support are skipped
    /// before their quota is touched. Raw provider series pass through
    /// [`timeseries::normalize`] before caching.
    ///
    /// # Errors
    /// As [`quote`](Self::quote); additionally [`FeedError::Unsupported`]
    /// when no registered provider supports history at all.
    pub async fn history(
        &self,
        ticker: &str,
        period: Period,
    ) -> Result<Fetched<Vec<HistoryPoint>>, FeedError> {
        let canonical = symbol::canonicalize(ticker)?;

        if let Some((CachePayload::History { period: p, points }, source)) =
            self.cache.get(&canonical, Category::History)
            && p == period
        {
            debug!(target: "kursfeed", ticker = %canonical, %source, "history cache hit");
            return Ok(Fetched {
                value: points,
                source,
                stale: false,
            });
        }

        let mut errors: Vec<FeedError> = Vec::new();
        let mut attempted_any = false;
        for provider in &self.providers {
            let id = provider.id();
            if !provider.supports_history() {
                debug!(target: "kursfeed", ticker = %canonical, provider = %id, "no history support, skipping");
                continue;
            }
            attempted_any = true;
            if let Err(e) = self.quota.try_acquire(id) {
                debug!(target: "kursfeed", ticker = %canonical, provider = %id, "quota skip");
                errors.push(e);
                continue;
            }
            let symbol = symbol::to_provider_format(&canonical, id)?;
            match Self::call_with_timeout(
                id,
                self.cfg.provider_timeout,
                provider.history(&symbol, period),
            )
            .await
            {
                Ok(raw) => {
                    let points = timeseries::normalize(raw);
                    self.cache.set(
                        &canonical,
                        Category::History,
                        CachePayload::History {
                            period,
                            points: points.clone(),
                        },
                        id,
                    );
                    info!(target: "kursfeed", ticker = %canonical, provider = %id, points = points.len(), "history fetched");
                    return Ok(Fetched {
                        value: points,
                        source: id,
                        stale: false,
                    });
                }
                Err(e) => {
                    self.quota.record_failure(id);
                    warn!(target: "kursfeed", ticker = %canonical, provider = %id, error = %e, "history attempt failed");
                    errors.push(e);
                }
            }
        }

        if !attempted_any {
            return Err(FeedError::unsupported("history"));
        }

        if let Some((CachePayload::History { period: p, points }, source)) =
            self.cache.get_stale(&canonical, Category::History)
            && p == period
        {
            warn!(target: "kursfeed", ticker = %canonical, %source, "all providers failed, serving stale history");
            return Ok(Fetched {
                value: points,
                source,
                stale: true,
            });
        }

        Err(collapse_errors(&canonical, errors))
    }

    /// Snapshot of `provider`'s quota window.
    #[must_use]
    pub fn quota_state(&self, provider: ProviderId) -> Option<QuotaState> {
        self.quota.state(provider)
    }

    /// Direct access to the underlying store, for host applications caching
    /// derived artifacts (`Category::Analysis`) alongside market data.
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Number of cache entries held, fresh and stale alike.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop hard-expired cache entries now. Returns how many were removed.
    pub fn sweep_cache(&self) -> usize {
        self.cache.sweep()
    }

    /// Spawn a Tokio task sweeping the cache every `interval`. The task runs
    /// until the returned handle is aborted or dropped along with the runtime.
    #[must_use]
    pub fn spawn_cache_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let me = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would sweep an empty store.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                me.sweep_cache();
            }
        })
    }
}
