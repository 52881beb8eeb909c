//! Error types for SportMonks API calls.
//!
//! Every failure at the HTTP boundary is normalized into one [`ApiError`], whose
//! [`ApiErrorKind`] identifies the category (not found, forbidden, rate limited,
//! transient server error, transport failure, anything else). Bad input is
//! rejected with [`Error::Validation`] before a request is ever sent.

use crate::rate_limit::RateLimitInfo;
use crate::transport::{RawResponse, TransportError};
use http::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// The main error type for this crate.
///
/// # Examples
///
/// ```no_run
/// use sportmonks::{ApiErrorKind, Error, SportMonksClient};
///
/// # async fn example() -> Result<(), Error> {
/// let client = SportMonksClient::builder().api_token("token").build()?;
///
/// match client.leagues().by_id(8)?.get::<serde_json::Value>().await {
///     Ok(response) => println!("League: {:?}", response.data),
///     Err(Error::Api(api)) if api.kind == ApiErrorKind::NotFound => {
///         eprintln!("No such league: {}", api.message);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input was rejected before any request was made.
    ///
    /// Raised for malformed dates, reversed date ranges, too-short search terms
    /// and the like. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The API call failed, after any retries the policy allowed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A successful response body could not be decoded.
    ///
    /// Preserves the raw body and the serde message for debugging.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    Deserialization {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api(api) => api.status,
            Error::Deserialization { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the request never received a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Api(api) if api.kind == ApiErrorKind::Transport)
    }

    /// Returns `true` if the request timed out before a response arrived.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Api(api) if api.timed_out)
    }

    /// Returns the normalized API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(api) => Some(api),
            _ => None,
        }
    }
}

/// The category of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// HTTP 404.
    NotFound,
    /// HTTP 403.
    Forbidden,
    /// HTTP 429.
    RateLimited,
    /// A status in the policy's retriable set.
    TransientServer,
    /// No HTTP response at all.
    Transport,
    /// Any other HTTP status.
    Unclassified,
}

/// A normalized failure from the HTTP boundary.
///
/// Created once when a request fails and never modified afterwards.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiError {
    /// The failure category.
    pub kind: ApiErrorKind,
    /// Human-readable message.
    pub message: String,
    /// The HTTP status, unset for transport failures.
    pub status: Option<StatusCode>,
    /// The `message` field of the upstream error body, if any.
    pub upstream_message: Option<String>,
    /// The `errors` object of the upstream error body, verbatim.
    pub field_errors: Option<Map<String, Value>>,
    /// How long until the rate limit resets, for 429 responses that say so.
    pub resets_in: Option<Duration>,
    /// Requests left in the current window, for 429 responses that say so.
    pub remaining: Option<u64>,
    /// The entity the exhausted quota applies to.
    pub requested_entity: Option<String>,
    /// Set for transport failures caused by the request timeout.
    pub timed_out: bool,
    /// The request path that failed.
    pub path: String,
}

#[derive(Deserialize, Default)]
struct UpstreamBody {
    message: Option<String>,
    errors: Option<Map<String, Value>>,
}

impl ApiError {
    /// Normalizes a non-success HTTP response.
    ///
    /// `retriable` marks statuses from the policy's retriable set, which are
    /// classified as [`ApiErrorKind::TransientServer`].
    pub fn from_response(response: &RawResponse, path: &str, retriable: bool) -> Self {
        let status = response.status;
        let upstream = serde_json::from_str::<UpstreamBody>(&response.body).unwrap_or_default();
        let upstream_message = upstream.message.filter(|m| !m.trim().is_empty());

        let mut quota = None;
        let (kind, message, resets_in) = match status {
            StatusCode::NOT_FOUND => (
                ApiErrorKind::NotFound,
                upstream_message
                    .clone()
                    .unwrap_or_else(|| format!("resource not found at {path}")),
                None,
            ),
            StatusCode::FORBIDDEN => (
                ApiErrorKind::Forbidden,
                upstream_message
                    .clone()
                    .unwrap_or_else(|| "access forbidden; check credentials/subscription".to_string()),
                None,
            ),
            StatusCode::TOO_MANY_REQUESTS => {
                let info = RateLimitInfo::from_response(&response.headers, &response.body);
                let base = upstream_message
                    .clone()
                    .unwrap_or_else(|| "rate limit exceeded".to_string());
                let message = match info.resets_in {
                    Some(delay) => format!("{base} (resets in {} seconds)", delay.as_secs()),
                    None => base,
                };
                let resets_in = info.resets_in;
                quota = Some(info);
                (ApiErrorKind::RateLimited, message, resets_in)
            }
            _ => {
                let kind = if retriable {
                    ApiErrorKind::TransientServer
                } else {
                    ApiErrorKind::Unclassified
                };
                let message = upstream_message
                    .clone()
                    .unwrap_or_else(|| generic_status_message(status));
                (kind, message, None)
            }
        };

        Self {
            kind,
            message,
            status: Some(status),
            upstream_message,
            field_errors: upstream.errors,
            resets_in,
            remaining: quota.as_ref().and_then(|info| info.remaining),
            requested_entity: quota.and_then(|info| info.requested_entity),
            timed_out: false,
            path: path.to_string(),
        }
    }

    /// Normalizes a failure that produced no HTTP response.
    pub fn from_transport(error: &TransportError, path: &str) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            message: error.message.clone(),
            status: None,
            upstream_message: None,
            field_errors: None,
            resets_in: None,
            remaining: None,
            requested_entity: None,
            timed_out: error.timed_out,
            path: path.to_string(),
        }
    }
}

fn generic_status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP status {} {reason}", status.as_u16()),
        None => format!("HTTP status {}", status.as_u16()),
    }
}

/// A specialized `Result` type for SportMonks API calls.
pub type Result<T> = std::result::Result<T, Error>;
