use std::sync::Arc;
use std::time::Duration;

use kursfeed::{FeedError, Kursfeed, Period, ProviderId, QuotaConfig};
use kursfeed_core::ManualClock;
use kursfeed_mock::MockConnector;

fn one_per_minute() -> QuotaConfig {
    QuotaConfig {
        limit: 1,
        window: Duration::from_secs(60),
    }
}

#[tokio::test]
async fn exhausted_provider_is_skipped_without_network_io() {
    let td = MockConnector::new(ProviderId::TwelveData);
    let fh = MockConnector::new(ProviderId::Finnhub);
    let feed = Kursfeed::builder()
        .with_provider(td.clone())
        .with_provider(fh.clone())
        .quota(ProviderId::TwelveData, one_per_minute())
        .build()
        .unwrap();

    feed.quote("AAPL").await.unwrap();
    let second = feed.quote("MSFT").await.unwrap();

    // The exhausted primary was never called for the second lookup.
    assert_eq!(second.source, ProviderId::Finnhub);
    assert_eq!(td.quote_calls(), 1);
    assert_eq!(fh.quote_calls(), 1);
}

#[tokio::test]
async fn window_reset_readmits_the_primary() {
    let clock = Arc::new(ManualClock::new());
    let td = MockConnector::new(ProviderId::TwelveData);
    let fh = MockConnector::new(ProviderId::Finnhub);
    let feed = Kursfeed::builder()
        .with_provider(td.clone())
        .with_provider(fh.clone())
        .quota(ProviderId::TwelveData, one_per_minute())
        .clock(clock.clone())
        .build()
        .unwrap();

    feed.quote("AAPL").await.unwrap();
    clock.advance(Duration::from_secs(60));
    let second = feed.quote("MSFT").await.unwrap();

    assert_eq!(second.source, ProviderId::TwelveData);
    assert_eq!(td.quote_calls(), 2);
    assert_eq!(fh.quote_calls(), 0);
}

#[tokio::test]
async fn failed_attempt_still_consumes_quota() {
    use kursfeed_mock::MockBehavior;

    let td = MockConnector::new(ProviderId::TwelveData);
    let fh = MockConnector::new(ProviderId::Finnhub);
    td.push_quote(MockBehavior::Fail(FeedError::transient(
        ProviderId::TwelveData,
        "boom",
    )))
    .await;

    let feed = Kursfeed::builder()
        .with_provider(td.clone())
        .with_provider(fh.clone())
        .quota(ProviderId::TwelveData, one_per_minute())
        .build()
        .unwrap();

    feed.quote("AAPL").await.unwrap();
    let state = feed.quota_state(ProviderId::TwelveData).unwrap();
    assert_eq!(state.remaining, 0);
    assert_eq!(state.failures, 1);

    // Next lookup skips the primary entirely.
    feed.quote("MSFT").await.unwrap();
    assert_eq!(td.quote_calls(), 1);
}

#[tokio::test]
async fn history_skips_unsupporting_provider_without_quota_cost() {
    let fh = MockConnector::without_history(ProviderId::Finnhub);
    let av = MockConnector::new(ProviderId::AlphaVantage);
    let feed = Kursfeed::builder()
        .with_provider(fh.clone())
        .with_provider(av.clone())
        .build()
        .unwrap();

    let fetched = feed.history("AAPL", Period::M1).await.unwrap();
    assert_eq!(fetched.source, ProviderId::AlphaVantage);
    assert_eq!(fh.history_calls(), 0);
    assert_eq!(
        feed.quota_state(ProviderId::Finnhub).unwrap().remaining,
        feed.quota_state(ProviderId::Finnhub).unwrap().limit
    );
}

#[tokio::test]
async fn history_with_no_capable_provider_is_unsupported() {
    let fh = MockConnector::without_history(ProviderId::Finnhub);
    let feed = Kursfeed::builder().with_provider(fh).build().unwrap();
    assert!(matches!(
        feed.history("AAPL", Period::M1).await,
        Err(FeedError::Unsupported { .. })
    ));
}

#[tokio::test]
async fn quota_state_reports_reset_countdown() {
    let clock = Arc::new(ManualClock::new());
    let td = MockConnector::new(ProviderId::TwelveData);
    let feed = Kursfeed::builder()
        .with_provider(td)
        .quota(ProviderId::TwelveData, one_per_minute())
        .clock(clock.clone())
        .build()
        .unwrap();

    feed.quote("AAPL").await.unwrap();
    clock.advance(Duration::from_secs(20));
    let state = feed.quota_state(ProviderId::TwelveData).unwrap();
    assert_eq!(state.limit, 1);
    assert_eq!(state.remaining, 0);
    assert_eq!(state.reset_in, Duration::from_secs(40));
}
