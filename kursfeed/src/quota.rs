//! Per-provider fixed-window call budgeting.
//!
//! Admission happens before any network I/O, so a skipped provider costs
//! nothing. A failed call never refunds its unit: the upstream already
//! counted it against the account.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use kursfeed_core::{Clock, FeedError, ProviderId, QuotaConfig};
use tracing::debug;

/// Snapshot of one provider's quota window, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    /// Calls admitted per window.
    pub limit: u32,
    /// Units left in the current window.
    pub remaining: u32,
    /// Time until the window resets.
    pub reset_in: Duration,
    /// Failed calls recorded since startup.
    pub failures: u64,
}

struct WindowState {
    cfg: QuotaConfig,
    window_start: Instant,
    count: u32,
    failures: u64,
}

impl WindowState {
    /// Reset the window if its duration has elapsed.
    fn roll(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= self.cfg.window {
            self.count = 0;
            self.window_start = now;
        }
    }

    fn reset_in(&self, now: Instant) -> Duration {
        self.cfg
            .window
            .saturating_sub(now.duration_since(self.window_start))
    }
}

/// Tracks a fixed-window budget per provider.
pub struct QuotaTracker {
    clock: Arc<dyn Clock>,
    providers: Mutex<HashMap<ProviderId, WindowState>>,
}

impl QuotaTracker {
    /// An empty tracker driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Register `provider` with its budget. The window starts now.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn register(&self, provider: ProviderId, cfg: QuotaConfig) {
        let mut providers = self.providers.lock().expect("quota mutex poisoned");
        providers.insert(
            provider,
            WindowState {
                cfg,
                window_start: self.clock.now(),
                count: 0,
                failures: 0,
            },
        );
    }

    /// Admit one call for `provider`, consuming a unit of its window.
    ///
    /// # Errors
    /// [`FeedError::QuotaExhausted`] when the window is full; the unit is
    /// not consumed. Unregistered providers are admitted against their
    /// free-tier default budget.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn try_acquire(&self, provider: ProviderId) -> Result<(), FeedError> {
        let now = self.clock.now();
        let mut providers = self.providers.lock().expect("quota mutex poisoned");
        let state = providers.entry(provider).or_insert_with(|| WindowState {
            cfg: QuotaConfig::for_provider(provider),
            window_start: now,
            count: 0,
            failures: 0,
        });
        state.roll(now);
        if state.count < state.cfg.limit {
            state.count += 1;
            Ok(())
        } else {
            let reset_in = state.reset_in(now);
            debug!(target: "kursfeed::quota", %provider, reset_in_ms = reset_in.as_millis() as u64, "window exhausted");
            Err(FeedError::QuotaExhausted {
                provider,
                reset_in_ms: u64::try_from(reset_in.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    /// Record a failed call. The consumed unit is never reclaimed.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn record_failure(&self, provider: ProviderId) {
        let mut providers = self.providers.lock().expect("quota mutex poisoned");
        if let Some(state) = providers.get_mut(&provider) {
            state.failures += 1;
        }
    }

    /// Units left in `provider`'s current window.
    #[must_use]
    pub fn remaining(&self, provider: ProviderId) -> u32 {
        self.state(provider).map_or(0, |s| s.remaining)
    }

    /// Fraction of the window consumed, `0.0..=1.0`.
    #[must_use]
    pub fn utilization(&self, provider: ProviderId) -> f64 {
        self.state(provider).map_or(0.0, |s| {
            if s.limit == 0 {
                1.0
            } else {
                f64::from(s.limit - s.remaining) / f64::from(s.limit)
            }
        })
    }

    /// Snapshot of `provider`'s window, or `None` if it was never registered.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn state(&self, provider: ProviderId) -> Option<QuotaState> {
        let now = self.clock.now();
        let mut providers = self.providers.lock().expect("quota mutex poisoned");
        providers.get_mut(&provider).map(|state| {
            state.roll(now);
            QuotaState {
                limit: state.cfg.limit,
                remaining: state.cfg.limit.saturating_sub(state.count),
                reset_in: state.reset_in(now),
                failures: state.failures,
            }
        })
    }
}
