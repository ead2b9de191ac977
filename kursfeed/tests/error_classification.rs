use std::time::Duration;

use kursfeed::{FeedError, Kursfeed, ProviderId};
use kursfeed_mock::{MockBehavior, MockConnector};

async fn feed_with_scripts(
    td_behavior: MockBehavior<kursfeed::Quote>,
    fh_behavior: MockBehavior<kursfeed::Quote>,
) -> Kursfeed {
    let td = MockConnector::new(ProviderId::TwelveData);
    let fh = MockConnector::new(ProviderId::Finnhub);
    td.push_quote(td_behavior).await;
    fh.push_quote(fh_behavior).await;
    Kursfeed::builder()
        .with_provider(td)
        .with_provider(fh)
        .provider_timeout(Duration::from_millis(100))
        .build()
        .unwrap()
}

#[tokio::test]
async fn all_not_found_surfaces_unknown_ticker() {
    let feed = feed_with_scripts(
        MockBehavior::Fail(FeedError::not_found("quote for ZZZZ")),
        MockBehavior::Fail(FeedError::not_found("quote for ZZZZ")),
    )
    .await;

    match feed.quote("ZZZZ").await {
        Err(FeedError::UnknownTicker { ticker }) => assert_eq!(ticker, "ZZZZ"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn all_rate_limited_surfaces_aggregate_rate_limit() {
    let feed = feed_with_scripts(
        MockBehavior::Fail(FeedError::RateLimited {
            provider: ProviderId::TwelveData,
        }),
        MockBehavior::Fail(FeedError::RateLimited {
            provider: ProviderId::Finnhub,
        }),
    )
    .await;

    assert!(matches!(
        feed.quote("AAPL").await,
        Err(FeedError::AllProvidersRateLimited)
    ));
}

#[tokio::test]
async fn all_transient_surfaces_provider_unavailable() {
    let feed = feed_with_scripts(
        MockBehavior::Fail(FeedError::transient(ProviderId::TwelveData, "500")),
        MockBehavior::Fail(FeedError::transient(ProviderId::Finnhub, "conn reset")),
    )
    .await;

    assert!(matches!(
        feed.quote("AAPL").await,
        Err(FeedError::ProviderUnavailable { .. })
    ));
}

#[tokio::test]
async fn hang_counts_as_timeout_and_classifies_as_unavailable() {
    let feed = feed_with_scripts(
        MockBehavior::Hang,
        MockBehavior::Fail(FeedError::transient(ProviderId::Finnhub, "down")),
    )
    .await;

    assert!(matches!(
        feed.quote("AAPL").await,
        Err(FeedError::ProviderUnavailable { .. })
    ));
}

#[tokio::test]
async fn mixed_failures_surface_the_full_error_list() {
    let feed = feed_with_scripts(
        MockBehavior::Fail(FeedError::not_found("quote for AAPL")),
        MockBehavior::Fail(FeedError::transient(ProviderId::Finnhub, "down")),
    )
    .await;

    match feed.quote("AAPL").await {
        Err(FeedError::AllProvidersFailed(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(matches!(errors[0], FeedError::NotFound { .. }));
            assert!(matches!(errors[1], FeedError::Transient { .. }));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn timeout_frees_the_fallback_to_answer() {
    let td = MockConnector::new(ProviderId::TwelveData);
    let fh = MockConnector::new(ProviderId::Finnhub);
    td.push_quote(MockBehavior::Hang).await;

    let feed = Kursfeed::builder()
        .with_provider(td.clone())
        .with_provider(fh.clone())
        .provider_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let fetched = feed.quote("AAPL").await.unwrap();
    assert_eq!(fetched.source, ProviderId::Finnhub);
    // The hung attempt still consumed its quota unit.
    let state = feed.quota_state(ProviderId::TwelveData).unwrap();
    assert_eq!(state.remaining, state.limit - 1);
    assert_eq!(state.failures, 1);
}
