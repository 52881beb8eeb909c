//! Rate limit hints carried by rate-limited responses.
//!
//! SportMonks reports its quota in the response body (`rate_limit.resets_in_seconds`).
//! When the body has no hint, the standard `Retry-After` header (seconds or
//! HTTP date) is used instead.

use http::HeaderMap;
use serde::Deserialize;
use std::time::{Duration, SystemTime};

/// Information extracted from a rate-limited response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RateLimitInfo {
    /// How long until the quota resets.
    pub resets_in: Option<Duration>,

    /// Requests remaining in the current window.
    pub remaining: Option<u64>,

    /// The entity the quota applies to, when reported.
    pub requested_entity: Option<String>,
}

#[derive(Deserialize)]
struct RateLimitBody {
    rate_limit: Option<RateLimitFields>,
    #[serde(flatten)]
    top_level: RateLimitFields,
}

#[derive(Deserialize, Default)]
struct RateLimitFields {
    resets_in_seconds: Option<u64>,
    remaining: Option<u64>,
    requested_entity: Option<String>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from a response body and headers.
    ///
    /// Body fields win over headers. Recognised sources, in order:
    /// - `rate_limit.resets_in_seconds` / `rate_limit.remaining` in the body
    /// - top-level `resets_in_seconds` / `remaining` in the body
    /// - `Retry-After` and `X-RateLimit-Remaining` headers
    ///
    /// # Examples
    ///
    /// ```
    /// use sportmonks::rate_limit::RateLimitInfo;
    /// use http::HeaderMap;
    /// use std::time::Duration;
    ///
    /// let body = r#"{"message":"Too many requests","rate_limit":{"resets_in_seconds":5,"remaining":0}}"#;
    /// let info = RateLimitInfo::from_response(&HeaderMap::new(), body);
    /// assert_eq!(info.resets_in, Some(Duration::from_secs(5)));
    /// ```
    pub fn from_response(headers: &HeaderMap, body: &str) -> Self {
        let fields = serde_json::from_str::<RateLimitBody>(body)
            .ok()
            .map(|parsed| {
                let nested = parsed.rate_limit.unwrap_or_default();
                RateLimitFields {
                    resets_in_seconds: nested
                        .resets_in_seconds
                        .or(parsed.top_level.resets_in_seconds),
                    remaining: nested.remaining.or(parsed.top_level.remaining),
                    requested_entity: nested
                        .requested_entity
                        .or(parsed.top_level.requested_entity),
                }
            })
            .unwrap_or_default();

        Self {
            resets_in: fields
                .resets_in_seconds
                .map(Duration::from_secs)
                .or_else(|| parse_retry_after(headers)),
            remaining: fields
                .remaining
                .or_else(|| parse_rate_limit_remaining(headers)),
            requested_entity: fields.requested_entity,
        }
    }
}

/// Parses the Retry-After header.
///
/// Supports both delay-seconds (integer) and HTTP-date formats.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get("retry-after")?.to_str().ok()?;

    if let Ok(seconds) = header.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date_time = httpdate::parse_http_date(header).ok()?;
    date_time.duration_since(SystemTime::now()).ok()
}

fn parse_rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    let header = headers.get("x-ratelimit-remaining")?.to_str().ok()?;
    header.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_nested_body_hint() {
        let body = r#"{"message":"slow down","rate_limit":{"resets_in_seconds":5,"remaining":0,"requested_entity":"Fixture"}}"#;
        let info = RateLimitInfo::from_response(&HeaderMap::new(), body);

        assert_eq!(info.resets_in, Some(Duration::from_secs(5)));
        assert_eq!(info.remaining, Some(0));
        assert_eq!(info.requested_entity.as_deref(), Some("Fixture"));
    }

    #[test]
    fn test_top_level_body_hint() {
        let body = r#"{"message":"slow down","resets_in_seconds":12}"#;
        let info = RateLimitInfo::from_response(&HeaderMap::new(), body);

        assert_eq!(info.resets_in, Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_body_hint_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("60"));
        let body = r#"{"rate_limit":{"resets_in_seconds":3}}"#;

        let info = RateLimitInfo::from_response(&headers, body);
        assert_eq!(info.resets_in, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_retry_after_seconds_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));

        let info = RateLimitInfo::from_response(&headers, "Too Many Requests");
        assert_eq!(info.resets_in, Some(Duration::from_secs(30)));
        assert_eq!(info.remaining, Some(0));
    }

    #[test]
    fn test_retry_after_http_date() {
        let future = SystemTime::now() + Duration::from_secs(120);
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_str(&httpdate::fmt_http_date(future)).unwrap(),
        );

        let info = RateLimitInfo::from_response(&headers, "");
        let delay = info.resets_in.unwrap();
        assert!(delay > Duration::from_secs(100) && delay <= Duration::from_secs(120));
    }

    #[test]
    fn test_no_hint() {
        let info = RateLimitInfo::from_response(&HeaderMap::new(), r#"{"message":"nope"}"#);
        assert_eq!(info, RateLimitInfo::default());
    }
}
