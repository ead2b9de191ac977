//! kursfeed
//!
//! Quota-aware, cache-backed market-data fetching with deterministic
//! provider fallback. Register vendor connectors in priority order; each
//! lookup goes cache → providers (quota-gated, timeout-bounded) → stale
//! cache → classified error.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kursfeed::Kursfeed;
//! use kursfeed_providers::{AlphaVantage, Finnhub, TwelveData};
//!
//! let feed = Kursfeed::builder()
//!     .with_provider(Arc::new(TwelveData::from_env()?))
//!     .with_provider(Arc::new(Finnhub::from_env()?))
//!     .with_provider(Arc::new(AlphaVantage::from_env()?))
//!     .build()?;
//!
//! let quote = feed.quote("SAP.DE").await?;
//! println!("{} = {:?} (stale: {})", quote.value.ticker, quote.value.price, quote.stale);
//! ```
//!
//! This crate assumes a Tokio 1.x runtime: provider attempts are bounded
//! with `tokio::time::timeout` and the cache sweeper runs as a spawned task.
#![warn(missing_docs)]

/// TTL cache with opt-in stale reads.
pub mod cache;
/// The orchestrator and its builder.
pub mod core;
/// Fixed-window quota tracking.
pub mod quota;

pub use cache::{CacheHit, CachePayload, CacheStore, SWEEP_GRACE};
pub use core::{Kursfeed, KursfeedBuilder};
pub use quota::{QuotaState, QuotaTracker};

pub use kursfeed_core::{
    CacheConfig, Category, FeedConfig, FeedError, Fetched, HistoryPoint, Period, ProviderConnector,
    ProviderId, Quote, QuotaConfig, SeriesPoint,
};
