//! kursfeed-mock
//!
//! A scripted in-memory `ProviderConnector` for deterministic tests. Each
//! call pops the next behavior from a per-method script queue; an empty
//! queue falls back to a fixture response. Every call is counted and every
//! symbol logged so tests can assert ordering and zero-network skips.
#![warn(missing_docs)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use kursfeed_core::{FeedError, Period, ProviderConnector, ProviderId, Quote, SeriesPoint};

/// Instruction for how the next call to a method should behave.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(FeedError),
    /// Hang indefinitely (simulate a stalled upstream, for timeout tests).
    Hang,
}

#[derive(Default)]
struct Script {
    quote: VecDeque<MockBehavior<Quote>>,
    history: VecDeque<MockBehavior<Vec<SeriesPoint>>>,
    quote_symbols: Vec<String>,
    history_symbols: Vec<String>,
}

/// A provider connector driven entirely by scripted behaviors.
pub struct MockConnector {
    id: ProviderId,
    history_supported: bool,
    script: Mutex<Script>,
    quote_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl MockConnector {
    /// A mock impersonating `id`, with history support and an empty script.
    #[must_use]
    pub fn new(id: ProviderId) -> Arc<Self> {
        Arc::new(Self {
            id,
            history_supported: true,
            script: Mutex::new(Script::default()),
            quote_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        })
    }

    /// A mock that reports no history capability, like the Finnhub free tier.
    #[must_use]
    pub fn without_history(id: ProviderId) -> Arc<Self> {
        Arc::new(Self {
            id,
            history_supported: false,
            script: Mutex::new(Script::default()),
            quote_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        })
    }

    /// Queue a behavior for the next unanswered `quote` call.
    pub async fn push_quote(&self, behavior: MockBehavior<Quote>) {
        self.script.lock().await.quote.push_back(behavior);
    }

    /// Queue a behavior for the next unanswered `history` call.
    pub async fn push_history(&self, behavior: MockBehavior<Vec<SeriesPoint>>) {
        self.script.lock().await.history.push_back(behavior);
    }

    /// Number of `quote` calls received so far.
    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    /// Number of `history` calls received so far.
    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// Symbols passed to `quote`, in call order.
    pub async fn quote_symbols(&self) -> Vec<String> {
        self.script.lock().await.quote_symbols.clone()
    }

    /// Symbols passed to `history`, in call order.
    pub async fn history_symbols(&self) -> Vec<String> {
        self.script.lock().await.history_symbols.clone()
    }

    /// The fixture quote returned when the script queue is empty.
    #[must_use]
    pub fn fixture_quote(id: ProviderId, symbol: &str) -> Quote {
        let mut quote = Quote::empty(symbol, id);
        quote.company_name = Some("Mock Corp".to_string());
        quote.price = Some(100.0);
        quote.change = Some(1.0);
        quote.change_percent = Some(1.0);
        quote.fetched_at = Utc::now();
        quote
    }

    /// The fixture series returned when the script queue is empty: three
    /// ascending daily closes.
    #[must_use]
    pub fn fixture_series() -> Vec<SeriesPoint> {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..3)
            .map(|i| SeriesPoint {
                date: d0 + chrono::Days::new(i),
                close: 100.0 + i as f64,
                volume: Some(1_000),
            })
            .collect()
    }

    async fn run<T>(&self, behavior: Option<MockBehavior<T>>, fixture: T) -> Result<T, FeedError> {
        match behavior {
            None => Ok(fixture),
            Some(MockBehavior::Return(v)) => Ok(v),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => futures::future::pending().await,
        }
    }
}

#[async_trait]
impl ProviderConnector for MockConnector {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn supports_history(&self) -> bool {
        self.history_supported
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, FeedError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = {
            let mut guard = self.script.lock().await;
            guard.quote_symbols.push(symbol.to_string());
            guard.quote.pop_front()
        };
        self.run(behavior, Self::fixture_quote(self.id, symbol)).await
    }

    async fn history(&self, symbol: &str, _period: Period) -> Result<Vec<SeriesPoint>, FeedError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = {
            let mut guard = self.script.lock().await;
            guard.history_symbols.push(symbol.to_string());
            guard.history.pop_front()
        };
        self.run(behavior, Self::fixture_series()).await
    }
}
