//! Shared HTTP plumbing for the vendor adapters.

use std::time::Duration;

use kursfeed_core::{FeedError, ProviderId};
use reqwest::StatusCode;
use serde_json::Value;

/// Per-request timeout applied on top of whatever the orchestrator enforces.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(8);

/// Issue a GET and decode the body as JSON, mapping transport and HTTP
/// failures into the shared taxonomy: timeouts become [`FeedError::Timeout`],
/// 429 becomes [`FeedError::RateLimited`], 404 becomes [`FeedError::NotFound`],
/// and everything else (connection errors, 5xx, malformed bodies) becomes
/// [`FeedError::Transient`].
pub(crate) async fn get_json(
    client: &reqwest::Client,
    provider: ProviderId,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Value, FeedError> {
    let resp = client
        .get(url)
        .query(query)
        .timeout(HTTP_TIMEOUT)
        .send()
        .await
        .map_err(|e| map_transport_error(provider, &e))?;

    let status = resp.status();
    match status {
        StatusCode::TOO_MANY_REQUESTS => return Err(FeedError::RateLimited { provider }),
        StatusCode::NOT_FOUND => {
            return Err(FeedError::not_found(format!("{provider}: {url}")));
        }
        s if !s.is_success() => {
            return Err(FeedError::transient(provider, format!("http status {s}")));
        }
        _ => {}
    }

    resp.json::<Value>()
        .await
        .map_err(|e| FeedError::transient(provider, format!("malformed json: {e}")))
}

fn map_transport_error(provider: ProviderId, err: &reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::Timeout { provider }
    } else {
        FeedError::transient(provider, err.to_string())
    }
}

/// Parse a vendor string field as `f64`, treating `""`, `"None"`, `"-"`, and
/// unparsable values as absent. Vendors encode missing numerics this way;
/// absence must stay `None` rather than become `0.0`.
pub(crate) fn opt_f64(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_opt_str(s).and_then(|s| s.parse().ok()),
        _ => None,
    }
}

/// Like [`opt_f64`] but for volumes.
pub(crate) fn opt_u64(v: Option<&Value>) -> Option<u64> {
    match v? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_opt_str(s).and_then(|s| s.parse().ok()),
        _ => None,
    }
}

/// A vendor string field, with the "absent" sentinels filtered out.
pub(crate) fn opt_str(v: Option<&Value>) -> Option<String> {
    parse_opt_str(v?.as_str()?).map(str::to_string)
}

fn parse_opt_str(s: &str) -> Option<&str> {
    let s = s.trim().trim_end_matches('%');
    if s.is_empty() || s == "None" || s == "-" {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_strings_are_absent() {
        assert_eq!(opt_f64(Some(&json!("None"))), None);
        assert_eq!(opt_f64(Some(&json!("-"))), None);
        assert_eq!(opt_f64(Some(&json!(""))), None);
        assert_eq!(opt_str(Some(&json!("None"))), None);
    }

    #[test]
    fn numbers_parse_from_both_encodings() {
        assert_eq!(opt_f64(Some(&json!("123.45"))), Some(123.45));
        assert_eq!(opt_f64(Some(&json!(123.45))), Some(123.45));
        assert_eq!(opt_u64(Some(&json!("42"))), Some(42));
        assert_eq!(opt_u64(Some(&json!(42))), Some(42));
    }

    #[test]
    fn percent_suffix_is_stripped() {
        assert_eq!(opt_f64(Some(&json!("1.23%"))), Some(1.23));
    }
}
