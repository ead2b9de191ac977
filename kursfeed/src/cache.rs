//! TTL cache keyed by `(ticker, category)` with opt-in stale reads.
//!
//! A normal `get` returns only fresh entries; `get_stale` is the explicit
//! degraded path taken once every provider has failed. Expired entries are
//! kept around until they age past `ttl * SWEEP_GRACE`, at which point
//! `sweep` drops them to bound memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use kursfeed_core::{CacheConfig, Category, Clock, HistoryPoint, Period, ProviderId, Quote};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Entries older than `ttl * SWEEP_GRACE` are dropped by [`CacheStore::sweep`].
pub const SWEEP_GRACE: u32 = 4;

/// What a cache entry holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CachePayload {
    /// A normalized quote.
    Quote(Quote),
    /// A normalized history series for one period.
    History {
        /// Period the series was fetched for.
        period: Period,
        /// The normalized points.
        points: Vec<HistoryPoint>,
    },
    /// An opaque derived artifact cached by the host application.
    Analysis(serde_json::Value),
}

struct Entry {
    payload: CachePayload,
    source: ProviderId,
    stored_at: Instant,
}

/// A fresh-or-stale cache read: payload plus the provider that produced it.
pub type CacheHit = (CachePayload, ProviderId);

/// Process-local TTL store for normalized payloads.
pub struct CacheStore {
    clock: Arc<dyn Clock>,
    cfg: CacheConfig,
    entries: Mutex<HashMap<(String, Category), Entry>>,
}

impl CacheStore {
    /// An empty store with `cfg` TTLs, driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, cfg: CacheConfig) -> Self {
        Self {
            clock,
            cfg,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh read. Returns `None` on a miss or once the TTL has elapsed.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, ticker: &str, category: Category) -> Option<CacheHit> {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("cache mutex poisoned");
        let entry = entries.get(&(ticker.to_string(), category))?;
        if now.duration_since(entry.stored_at) < self.cfg.ttl_for(category) {
            Some((entry.payload.clone(), entry.source))
        } else {
            None
        }
    }

    /// Stale read: returns the entry regardless of TTL. The degraded path
    /// for when every provider has failed.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get_stale(&self, ticker: &str, category: Category) -> Option<CacheHit> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        entries
            .get(&(ticker.to_string(), category))
            .map(|e| (e.payload.clone(), e.source))
    }

    /// Store `payload`, unconditionally overwriting any previous entry.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn set(&self, ticker: &str, category: Category, payload: CachePayload, source: ProviderId) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            (ticker.to_string(), category),
            Entry {
                payload,
                source,
                stored_at: self.clock.now(),
            },
        );
    }

    /// Drop entries older than `ttl * SWEEP_GRACE`. Returns how many were
    /// removed. Entries inside the grace window survive so stale reads keep
    /// working for a while after expiry.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let before = entries.len();
        entries.retain(|(_, category), entry| {
            now.duration_since(entry.stored_at) < self.cfg.ttl_for(*category) * SWEEP_GRACE
        });
        let removed = before - entries.len();
        if removed > 0 {
            debug!(target: "kursfeed::cache", removed, remaining = entries.len(), "sweep");
        }
        removed
    }

    /// Number of entries currently held, fresh and stale alike.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kursfeed_core::ManualClock;
    use std::time::Duration;

    fn store_with_info_ttl(ttl: Duration) -> (Arc<ManualClock>, CacheStore) {
        let clock = Arc::new(ManualClock::new());
        let cfg = CacheConfig::default().with_ttl(Category::Info, ttl);
        (clock.clone(), CacheStore::new(clock, cfg))
    }

    fn quote(ticker: &str) -> CachePayload {
        CachePayload::Quote(Quote::empty(ticker, ProviderId::TwelveData))
    }

    #[test]
    fn fresh_get_misses_after_ttl_but_stale_get_hits() {
        let (clock, store) = store_with_info_ttl(Duration::from_secs(10));
        store.set("AAPL", Category::Info, quote("AAPL"), ProviderId::TwelveData);

        assert!(store.get("AAPL", Category::Info).is_some());
        clock.advance(Duration::from_secs(11));
        assert!(store.get("AAPL", Category::Info).is_none());
        let (_, source) = store.get_stale("AAPL", Category::Info).unwrap();
        assert_eq!(source, ProviderId::TwelveData);
    }

    #[test]
    fn set_overwrites_and_restamps() {
        let (clock, store) = store_with_info_ttl(Duration::from_secs(10));
        store.set("AAPL", Category::Info, quote("AAPL"), ProviderId::TwelveData);
        clock.advance(Duration::from_secs(9));
        store.set("AAPL", Category::Info, quote("AAPL"), ProviderId::Finnhub);
        clock.advance(Duration::from_secs(9));

        // Fresh again because the second write restarted the TTL.
        let (_, source) = store.get("AAPL", Category::Info).unwrap();
        assert_eq!(source, ProviderId::Finnhub);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sweep_drops_only_entries_past_grace() {
        let (clock, store) = store_with_info_ttl(Duration::from_secs(10));
        store.set("OLD", Category::Info, quote("OLD"), ProviderId::TwelveData);
        clock.advance(Duration::from_secs(30));
        store.set("MID", Category::Info, quote("MID"), ProviderId::TwelveData);
        clock.advance(Duration::from_secs(11));

        // OLD is 41s old (past 10s * 4); MID is 11s old (expired, within grace).
        assert_eq!(store.sweep(), 1);
        assert!(store.get_stale("OLD", Category::Info).is_none());
        assert!(store.get_stale("MID", Category::Info).is_some());
    }

    #[test]
    fn categories_do_not_collide() {
        let (_clock, store) = store_with_info_ttl(Duration::from_secs(10));
        store.set("AAPL", Category::Info, quote("AAPL"), ProviderId::TwelveData);
        assert!(store.get("AAPL", Category::History).is_none());
    }
}
