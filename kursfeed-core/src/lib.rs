//! kursfeed-core
//!
//! Canonical types, provider contract, and normalization utilities shared
//! across the kursfeed workspace.
//!
//! - `types`: the canonical quote/history model and lookup metadata.
//! - `connector`: the `ProviderConnector` trait and the vendor identity enum.
//! - `symbol`: ticker validation and per-vendor symbol mapping.
//! - `timeseries`: history dedup, ordering, and percent normalization.
//! - `config`: quota, cache, and pipeline tuning knobs.
//! - `clock`: injectable monotonic time source for deterministic tests.
//!
//! This crate contains no network code; vendor HTTP adapters live in
//! `kursfeed-providers` and the fallback pipeline in `kursfeed`.
#![warn(missing_docs)]

/// Injectable monotonic clock.
pub mod clock;
/// Quota, cache, and pipeline configuration.
pub mod config;
/// The provider contract and vendor identities.
pub mod connector;
/// The workspace error type and failure classification.
pub mod error;
/// Ticker validation and vendor symbol mapping.
pub mod symbol;
/// History-series normalization.
pub mod timeseries;
/// Canonical market-data model.
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, FeedConfig, QuotaConfig};
pub use connector::{ProviderConnector, ProviderId};
pub use error::FeedError;
pub use types::{Category, Fetched, HistoryPoint, Period, Quote, SeriesPoint};
