//! Response envelopes and the wrapper carrying HTTP details.
//!
//! Every SportMonks response wraps its entities in an envelope:
//!
//! ```json
//! {
//!   "data": [ ... ],
//!   "pagination": { "count": 25, "per_page": 25, "current_page": 1, "next_page": "...", "has_more": true },
//!   "rate_limit": { "remaining": 2999, "resets_in_seconds": 3600, "requested_entity": "Fixture" },
//!   "subscription": [ ... ],
//!   "timezone": "UTC"
//! }
//! ```
//!
//! [`Envelope`] distinguishes single-entity and paginated payloads by the
//! presence of `pagination` at decode time. [`Response`] adds the transport
//! details: status, headers, latency and attempt count.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Pagination metadata of a collection response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    /// Items on this page.
    #[serde(default)]
    pub count: u64,
    /// Page size.
    #[serde(default)]
    pub per_page: u32,
    /// This page's number.
    #[serde(default)]
    pub current_page: u32,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next_page: Option<String>,
    /// Whether more pages follow.
    #[serde(default)]
    pub has_more: bool,
}

/// Quota information reported alongside successful responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    /// Requests left in the current window.
    #[serde(default)]
    pub remaining: u64,
    /// Seconds until the window resets.
    #[serde(default)]
    pub resets_in_seconds: u64,
    /// The entity the quota applies to.
    #[serde(default)]
    pub requested_entity: Option<String>,
}

/// Metadata shared by single and paginated envelopes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeMeta {
    /// Quota information, when reported.
    pub rate_limit: Option<RateLimit>,
    /// Subscription details, verbatim.
    pub subscription: Option<Value>,
    /// The timezone the response's timestamps are expressed in.
    pub timezone: Option<String>,
}

/// The envelope as received, before `data` is given a type.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    /// The entity payload.
    #[serde(default)]
    pub data: Value,
    /// Pagination metadata, present on collection responses.
    #[serde(default)]
    pub pagination: Option<Pagination>,
    /// Quota information.
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
    /// Subscription details.
    #[serde(default)]
    pub subscription: Option<Value>,
    /// Timezone tag.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl RawEnvelope {
    fn into_parts(self) -> (Value, Option<Pagination>, EnvelopeMeta) {
        (
            self.data,
            self.pagination,
            EnvelopeMeta {
                rate_limit: self.rate_limit,
                subscription: self.subscription,
                timezone: self.timezone,
            },
        )
    }
}

/// A single-entity payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleResponse<T> {
    /// The entity.
    pub data: T,
    /// Envelope metadata.
    pub meta: EnvelopeMeta,
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResponse<T> {
    /// The entities on this page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub pagination: Pagination,
    /// Envelope metadata.
    pub meta: EnvelopeMeta,
}

/// A decoded response envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// The response had no `pagination`.
    Single(SingleResponse<T>),
    /// The response had `pagination`; `data` is a list.
    Paginated(PaginatedResponse<T>),
}

impl<T> Envelope<T> {
    /// Envelope metadata.
    pub fn meta(&self) -> &EnvelopeMeta {
        match self {
            Envelope::Single(single) => &single.meta,
            Envelope::Paginated(page) => &page.meta,
        }
    }

    /// Pagination metadata, for paginated envelopes.
    pub fn pagination(&self) -> Option<&Pagination> {
        match self {
            Envelope::Single(_) => None,
            Envelope::Paginated(page) => Some(&page.pagination),
        }
    }

    /// Returns `true` if more pages follow this one.
    pub fn has_more(&self) -> bool {
        self.pagination().is_some_and(|p| p.has_more)
    }

    /// The entities as a list: one for single envelopes, the page for paginated ones.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Envelope::Single(single) => vec![single.data],
            Envelope::Paginated(page) => page.data,
        }
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Gives the raw envelope's `data` a type.
    ///
    /// `status` and `raw_body` are only used to report decoding failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deserialization`] if `data` does not match `T`
    /// (or `Vec<T>` for paginated envelopes).
    pub fn decode(raw: RawEnvelope, status: StatusCode, raw_body: &str) -> Result<Self> {
        let (data, pagination, meta) = raw.into_parts();
        let deserialization = |e: serde_json::Error| Error::Deserialization {
            raw_response: raw_body.to_string(),
            serde_error: e.to_string(),
            status,
        };

        match pagination {
            Some(pagination) => Ok(Envelope::Paginated(PaginatedResponse {
                data: serde_json::from_value(data).map_err(deserialization)?,
                pagination,
                meta,
            })),
            None => Ok(Envelope::Single(SingleResponse {
                data: serde_json::from_value(data).map_err(deserialization)?,
                meta,
            })),
        }
    }

    /// Decodes one page of a collection walk.
    ///
    /// Like [`decode`](Self::decode), except that an unpaginated list becomes a
    /// final page holding every item.
    pub(crate) fn decode_collection(
        raw: RawEnvelope,
        status: StatusCode,
        raw_body: &str,
    ) -> Result<Self> {
        if raw.pagination.is_some() || !raw.data.is_array() {
            return Self::decode(raw, status, raw_body);
        }

        let (data, _, meta) = raw.into_parts();
        let items: Vec<T> = serde_json::from_value(data).map_err(|e| Error::Deserialization {
            raw_response: raw_body.to_string(),
            serde_error: e.to_string(),
            status,
        })?;

        Ok(Envelope::Paginated(PaginatedResponse {
            pagination: Pagination {
                count: items.len() as u64,
                per_page: u32::try_from(items.len()).unwrap_or(u32::MAX),
                current_page: 1,
                next_page: None,
                has_more: false,
            },
            data: items,
            meta,
        }))
    }
}

/// A successful response with its transport details.
///
/// Dereferences to the data it carries.
///
/// # Examples
///
/// ```no_run
/// use sportmonks::SportMonksClient;
///
/// # async fn example() -> Result<(), sportmonks::Error> {
/// let client = SportMonksClient::builder().api_token("token").build()?;
/// let response = client.leagues().all().get::<serde_json::Value>().await?;
///
/// println!("Status: {}", response.status);
/// println!("Request took {:?}", response.latency);
/// println!("Attempts: {}", response.attempts);
/// if let Some(pagination) = response.pagination() {
///     println!("Page {} has more: {}", pagination.current_page, pagination.has_more);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded data.
    pub data: T,

    /// The raw response body.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from the first attempt until the successful response, including
    /// any retry delays.
    pub latency: Duration,

    /// The number of attempts made; `1` when no retry was needed.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the data to a different type, keeping the metadata.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Like [`map`](Self::map), for fallible conversions that may need the
    /// status and raw body.
    pub fn try_map<U, F>(self, f: F) -> Result<Response<U>>
    where
        F: FnOnce(T, StatusCode, &str) -> Result<U>,
    {
        let data = f(self.data, self.status, &self.raw_body)?;
        Ok(Response {
            data,
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        })
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct League {
        id: u64,
        name: String,
    }

    fn raw(value: Value) -> RawEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_single_envelope() {
        let envelope = Envelope::<League>::decode(
            raw(json!({
                "data": {"id": 8, "name": "Premier League"},
                "timezone": "UTC",
                "rate_limit": {"remaining": 2999, "resets_in_seconds": 3600, "requested_entity": "League"}
            })),
            StatusCode::OK,
            "",
        )
        .unwrap();

        assert!(!envelope.has_more());
        assert_eq!(envelope.meta().timezone.as_deref(), Some("UTC"));
        assert_eq!(envelope.meta().rate_limit.as_ref().unwrap().remaining, 2999);
        match envelope {
            Envelope::Single(single) => assert_eq!(single.data.name, "Premier League"),
            Envelope::Paginated(_) => panic!("expected a single envelope"),
        }
    }

    #[test]
    fn test_paginated_envelope() {
        let envelope = Envelope::<League>::decode(
            raw(json!({
                "data": [{"id": 8, "name": "Premier League"}, {"id": 9, "name": "Championship"}],
                "pagination": {"count": 2, "per_page": 2, "current_page": 1, "next_page": "https://api.sportmonks.com/v3/football/leagues?page=2", "has_more": true}
            })),
            StatusCode::OK,
            "",
        )
        .unwrap();

        assert!(envelope.has_more());
        assert_eq!(envelope.pagination().unwrap().current_page, 1);
        let items = envelope.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, 9);
    }

    #[test]
    fn test_decode_failure_keeps_raw_body() {
        let result = Envelope::<League>::decode(
            raw(json!({"data": {"id": "eight"}})),
            StatusCode::OK,
            r#"{"data":{"id":"eight"}}"#,
        );

        match result {
            Err(Error::Deserialization {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(status, StatusCode::OK);
                assert!(raw_response.contains("eight"));
            }
            other => panic!("expected a deserialization error, got {other:?}"),
        }
    }

    #[test]
    fn test_response_helpers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        let response = Response::new(
            21,
            "21".to_string(),
            StatusCode::OK,
            headers,
            Duration::from_millis(5),
            3,
        );

        assert!(response.was_retried());
        assert_eq!(response.header("content-type"), Some("application/json"));

        let doubled = response.map(|n| n * 2);
        assert_eq!(*doubled, 42);
    }
}
