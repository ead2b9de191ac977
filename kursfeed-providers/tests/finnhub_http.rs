use httpmock::prelude::*;
use kursfeed_core::{FeedError, Period, ProviderConnector};
use kursfeed_providers::Finnhub;
use serde_json::json;

#[tokio::test]
async fn quote_merges_best_effort_profile() {
    let server = MockServer::start_async().await;
    let quote_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/quote")
                .query_param("symbol", "AAPL")
                .query_param("token", "test-key");
            then.status(200).json_body(json!({
                "c": 189.95, "d": 1.25, "dp": 0.66,
                "h": 190.5, "l": 188.2, "o": 188.9, "pc": 188.7, "t": 1_700_000_000
            }));
        })
        .await;
    let profile_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/stock/profile2").query_param("symbol", "AAPL");
            then.status(200).json_body(json!({
                "name": "Apple Inc",
                "finnhubIndustry": "Technology",
                "marketCapitalization": 2_950_000.0
            }));
        })
        .await;

    let fh = Finnhub::with_base_url("test-key", server.base_url());
    let quote = fh.quote("AAPL").await.unwrap();

    quote_mock.assert_async().await;
    profile_mock.assert_async().await;
    assert_eq!(quote.price, Some(189.95));
    assert_eq!(quote.company_name.as_deref(), Some("Apple Inc"));
    assert_eq!(quote.sector.as_deref(), Some("Technology"));
    // marketCapitalization arrives in millions.
    assert_eq!(quote.market_cap, Some(2_950_000.0 * 1e6));
}

#[tokio::test]
async fn profile_failure_degrades_to_none_fields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/quote");
            then.status(200).json_body(json!({ "c": 50.0, "d": 0.5, "dp": 1.0 }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stock/profile2");
            then.status(500);
        })
        .await;

    let fh = Finnhub::with_base_url("k", server.base_url());
    let quote = fh.quote("AAPL").await.unwrap();
    assert_eq!(quote.price, Some(50.0));
    assert_eq!(quote.company_name, None);
    assert_eq!(quote.market_cap, None);
}

#[tokio::test]
async fn zero_close_means_unknown_ticker() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/quote");
            then.status(200).json_body(json!({
                "c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0
            }));
        })
        .await;

    let fh = Finnhub::with_base_url("k", server.base_url());
    assert!(matches!(
        fh.quote("NOPE").await,
        Err(FeedError::NotFound { .. })
    ));
}

#[tokio::test]
async fn history_is_unsupported_without_network_io() {
    // No mocks registered: the call must never reach the network.
    let server = MockServer::start_async().await;
    let fh = Finnhub::with_base_url("k", server.base_url());
    assert!(matches!(
        fh.history("AAPL", Period::M1).await,
        Err(FeedError::Unsupported { .. })
    ));
    assert!(!fh.supports_history());
}

#[tokio::test]
async fn http_429_maps_to_rate_limited() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/quote");
            then.status(429);
        })
        .await;

    let fh = Finnhub::with_base_url("k", server.base_url());
    assert!(matches!(
        fh.quote("AAPL").await,
        Err(FeedError::RateLimited { .. })
    ));
}
