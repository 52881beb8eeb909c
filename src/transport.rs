//! The HTTP boundary.
//!
//! [`Transport`] performs a single GET and reports either a response (any
//! status) or a [`TransportError`] when no response was received at all.
//! Retries and error classification happen above this layer.

use crate::{metadata::RequestMetadata, Error, Result};
use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use std::time::Duration;
use url::Url;

/// A response as received from the wire, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body as text.
    pub body: String,
}

impl RawResponse {
    /// Creates a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// The request never produced a response (connection refused, reset, timeout).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable description from the HTTP library.
    pub message: String,
    /// Whether the failure was a timeout.
    pub timed_out: bool,
}

impl TransportError {
    /// Creates a transport error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        // The URL carries the API token in its query string.
        let timed_out = error.is_timeout();
        Self {
            message: error.without_url().to_string(),
            timed_out,
        }
    }
}

/// Performs one GET request.
///
/// Implement this to route requests through something other than `reqwest`,
/// e.g. a scripted transport in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a GET for `request`, returning the response whatever its status.
    async fn get(&self, request: &RequestMetadata) -> std::result::Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Creates a transport for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry path segments
    /// (e.g. `mailto:` URLs).
    pub fn new(http_client: reqwest::Client, base_url: Url, timeout: Option<Duration>) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::Configuration(format!(
                "Base URL cannot be used as a base: {base_url}"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            timeout,
        })
    }

    /// Builds the full URL for a request: base path, then each segment
    /// percent-encoded, then query parameters.
    pub fn url_for(&self, request: &RequestMetadata) -> Url {
        let mut url = self.base_url.clone();

        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(&request.segments);
        }

        if !request.query_params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &request.query_params {
                query.append_pair(key, value);
            }
        }

        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &RequestMetadata) -> std::result::Result<RawResponse, TransportError> {
        let url = self.url_for(request);

        let mut builder = self.http_client.get(url);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(reqwest::Client::new(), Url::parse(base).unwrap(), None).unwrap()
    }

    #[test]
    fn test_url_keeps_base_path() {
        let transport = transport("https://api.sportmonks.com/v3/football");
        let request = RequestMetadata::new(["leagues", "8"]);

        assert_eq!(
            transport.url_for(&request).as_str(),
            "https://api.sportmonks.com/v3/football/leagues/8"
        );
    }

    #[test]
    fn test_url_with_trailing_slash_base() {
        let transport = transport("https://api.sportmonks.com/v3/football/");
        let request = RequestMetadata::new(["teams"]);

        assert_eq!(
            transport.url_for(&request).as_str(),
            "https://api.sportmonks.com/v3/football/teams"
        );
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let transport = transport("https://api.sportmonks.com/v3/football");
        let request = RequestMetadata::new(["teams", "search", "Real Madrid/B"])
            .with_query_param("include", "country;venue");

        let url = transport.url_for(&request);
        assert_eq!(url.path(), "/v3/football/teams/search/Real%20Madrid%2FB");
        assert_eq!(url.query(), Some("include=country%3Bvenue"));
    }

    #[tokio::test]
    async fn test_connection_error_hides_query_string() {
        let transport = transport("http://127.0.0.1:1/v3/football");
        let request = RequestMetadata::new(["leagues"]).with_query_param("api_token", "SECRET-TOKEN");

        let error = transport.get(&request).await.unwrap_err();

        assert!(!error.message.is_empty());
        assert!(!error.message.contains("SECRET-TOKEN"));
        assert!(!error.message.contains("api_token"));
        assert!(!error.timed_out);
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = HttpTransport::new(
            reqwest::Client::new(),
            Url::parse("mailto:someone@example.com").unwrap(),
            None,
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
