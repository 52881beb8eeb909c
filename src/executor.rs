//! Retry-aware execution of single GET requests.
//!
//! [`RequestExecutor`] sends a request through its [`Transport`], classifies the
//! outcome, and retries according to its [`RetryPolicy`]:
//!
//! - no response at all: always retried
//! - HTTP 429: retried if the policy allows, waiting exactly the reset hint when
//!   the response carries one
//! - any other status: retried if it is in the policy's retriable set
//!
//! Once the retry budget is spent the last failure is returned as an
//! [`ApiError`](crate::ApiError).

use crate::{
    error::ApiError,
    metadata::RequestMetadata,
    response::{RawEnvelope, Response},
    retry::{RetryPolicy, Sleeper},
    transport::{RawResponse, Transport, TransportError},
    Error, Result,
};
use http::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Query parameter carrying the API token.
pub const API_TOKEN_PARAM: &str = "api_token";

/// Executes GET requests with retries.
///
/// Holds only shared, immutable state, so one executor serves any number of
/// concurrent request chains. Executors do not coordinate rate limits with
/// each other.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: Arc<RetryPolicy>,
    api_token: String,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

enum Failure {
    Transport(TransportError),
    Http(RawResponse),
}

impl RequestExecutor {
    /// Creates an executor.
    pub fn new(
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy: Arc::new(policy),
            api_token: api_token.into(),
        }
    }

    /// The retry policy shared by every request from this executor.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes one GET, retrying as the policy allows, and decodes the envelope.
    ///
    /// # Errors
    ///
    /// - [`Error::Api`] with the final failure once retries are exhausted or the
    ///   failure is not retriable
    /// - [`Error::Deserialization`] if a successful body is not an envelope
    pub async fn execute(&self, request: &RequestMetadata) -> Result<Response<RawEnvelope>> {
        let path = request.path();
        let outgoing = request
            .clone()
            .with_query_param(API_TOKEN_PARAM, self.api_token.as_str());

        let start_time = Instant::now();
        let mut attempt = 0;
        let mut backoff_index = 0u32;

        loop {
            attempt += 1;

            tracing::debug!(
                path = %path,
                params = ?request.query_params,
                attempt = attempt,
                "Executing HTTP request"
            );

            let failure = match self.transport.get(&outgoing).await {
                Ok(response) if response.status.is_success() => {
                    return self.parse_response(response, start_time.elapsed(), attempt);
                }
                Ok(response) => {
                    log_http_failure(&response);
                    Failure::Http(response)
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        timed_out = e.timed_out,
                        attempt = attempt,
                        path = %path,
                        "Request failed without a response"
                    );
                    Failure::Transport(e)
                }
            };

            let error = self.normalize(&failure, &path);
            let retries_used = attempt - 1;

            if retries_used >= self.policy.max_retries() || !self.is_retriable(&failure) {
                if retries_used > 0 {
                    tracing::warn!(
                        attempts = attempt,
                        path = %path,
                        error = %error,
                        "Giving up after retries"
                    );
                }
                return Err(Error::Api(error));
            }

            // Only 429 responses carry a reset hint.
            let delay = match error.resets_in {
                Some(hint) => {
                    tracing::info!(
                        rate_limit_delay_ms = hint.as_millis() as u64,
                        attempt = attempt,
                        "Rate limited - waiting for reset before retry"
                    );
                    hint
                }
                None => {
                    let delay = self.policy.backoff_delay(backoff_index);
                    backoff_index += 1;
                    tracing::info!(
                        delay_ms = delay.as_millis() as u64,
                        attempt = attempt,
                        "Retrying request after delay"
                    );
                    delay
                }
            };

            self.sleeper.sleep(delay).await;
        }
    }

    fn is_retriable(&self, failure: &Failure) -> bool {
        match failure {
            Failure::Transport(_) => true,
            Failure::Http(response) if response.status == StatusCode::TOO_MANY_REQUESTS => {
                self.policy.retry_on_rate_limit()
            }
            Failure::Http(response) => self.policy.is_retriable_status(response.status),
        }
    }

    fn normalize(&self, failure: &Failure, path: &str) -> ApiError {
        match failure {
            Failure::Transport(e) => ApiError::from_transport(e, path),
            Failure::Http(response) => ApiError::from_response(
                response,
                path,
                self.policy.is_retriable_status(response.status),
            ),
        }
    }

    fn parse_response(
        &self,
        response: RawResponse,
        latency: Duration,
        attempts: usize,
    ) -> Result<Response<RawEnvelope>> {
        let RawResponse {
            status,
            headers,
            body,
        } = response;

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            attempts = attempts,
            "Received HTTP response"
        );

        match serde_json::from_str::<RawEnvelope>(&body) {
            Ok(envelope) => Ok(Response::new(
                envelope, body, status, headers, latency, attempts,
            )),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %body,
                    "Failed to deserialize response envelope"
                );

                Err(Error::Deserialization {
                    raw_response: body,
                    serde_error: e.to_string(),
                    status,
                })
            }
        }
    }
}

fn log_http_failure(response: &RawResponse) {
    let status = response.status;
    if status.is_client_error() {
        tracing::error!(
            status = status.as_u16(),
            response = %response.body,
            "Client error (4xx)"
        );
    } else if status.is_server_error() {
        tracing::warn!(
            status = status.as_u16(),
            response = %response.body,
            "Server error (5xx)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::test_support::{ok_body, RecordingSleeper, ScriptedTransport};

    fn executor(
        transport: &Arc<ScriptedTransport>,
        sleeper: &Arc<RecordingSleeper>,
        policy: RetryPolicy,
    ) -> RequestExecutor {
        RequestExecutor::new(transport.clone(), sleeper.clone(), policy, "secret")
    }

    fn policy_503(max_retries: usize) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(max_retries)
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(2))
            .retry_status_codes([503])
            .build()
    }

    #[tokio::test]
    async fn test_succeeds_after_two_503s() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::new(StatusCode::SERVICE_UNAVAILABLE, "")),
            Ok(RawResponse::new(StatusCode::SERVICE_UNAVAILABLE, "")),
            Ok(ok_body(r#"{"data":{"id":1}}"#)),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let response = executor(&transport, &sleeper, policy_503(2))
            .execute(&RequestMetadata::new(["leagues", "1"]))
            .await
            .unwrap();

        assert_eq!(transport.calls(), 3);
        assert_eq!(response.attempts, 3);
        assert!(response.was_retried());
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_budget_with_final_status() {
        let transport = Arc::new(ScriptedTransport::repeating(Ok(RawResponse::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "",
        ))));
        let sleeper = Arc::new(RecordingSleeper::default());

        let error = executor(&transport, &sleeper, policy_503(2))
            .execute(&RequestMetadata::new(["leagues"]))
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 3);
        assert_eq!(error.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(error.as_api().unwrap().kind, ApiErrorKind::TransientServer);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_reset_hint() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::new(
                StatusCode::TOO_MANY_REQUESTS,
                r#"{"message":"Too many requests","rate_limit":{"resets_in_seconds":5}}"#,
            )),
            Ok(ok_body(r#"{"data":[]}"#)),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RetryPolicy::builder()
            .max_retries(1)
            .base_delay(Duration::from_millis(10))
            .build();

        executor(&transport, &sleeper, policy)
            .execute(&RequestMetadata::new(["fixtures"]))
            .await
            .unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(5)]);
    }

    #[tokio::test]
    async fn test_rate_limit_hint_does_not_advance_backoff() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::new(StatusCode::SERVICE_UNAVAILABLE, "")),
            Ok(RawResponse::new(
                StatusCode::TOO_MANY_REQUESTS,
                r#"{"rate_limit":{"resets_in_seconds":2}}"#,
            )),
            Ok(RawResponse::new(StatusCode::SERVICE_UNAVAILABLE, "")),
            Ok(ok_body(r#"{"data":null}"#)),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        executor(&transport, &sleeper, policy_503(3))
            .execute(&RequestMetadata::new(["fixtures"]))
            .await
            .unwrap();

        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_secs(2),
                Duration::from_millis(200),
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_not_retried_when_disabled() {
        let transport = Arc::new(ScriptedTransport::repeating(Ok(RawResponse::new(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"rate_limit":{"resets_in_seconds":5}}"#,
        ))));
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RetryPolicy::builder().retry_on_rate_limit(false).build();

        let error = executor(&transport, &sleeper, policy)
            .execute(&RequestMetadata::new(["fixtures"]))
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert!(sleeper.delays().is_empty());
        let api = error.as_api().unwrap();
        assert_eq!(api.kind, ApiErrorKind::RateLimited);
        assert!(api.message.contains("resets in 5 seconds"));
    }

    #[tokio::test]
    async fn test_rate_limit_without_hint_uses_backoff() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::new(StatusCode::TOO_MANY_REQUESTS, "")),
            Ok(ok_body(r#"{"data":{}}"#)),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        executor(&transport, &sleeper, policy_503(1))
            .execute(&RequestMetadata::new(["fixtures"]))
            .await
            .unwrap();

        assert_eq!(sleeper.delays(), vec![Duration::from_millis(100)]);
    }

    #[tokio::test]
    async fn test_transport_failures_always_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::new("connection reset by peer")),
            Err(TransportError::new("connection reset by peer")),
            Ok(ok_body(r#"{"data":{"id":3}}"#)),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RetryPolicy::builder()
            .max_retries(2)
            .retry_status_codes(Vec::new())
            .base_delay(Duration::from_millis(1))
            .build();

        let response = executor(&transport, &sleeper, policy)
            .execute(&RequestMetadata::new(["teams", "3"]))
            .await
            .unwrap();

        assert_eq!(response.attempts, 3);
    }

    #[tokio::test]
    async fn test_transport_failure_exhausts_budget() {
        let transport = Arc::new(ScriptedTransport::repeating(Err(TransportError::new(
            "connection refused",
        ))));
        let sleeper = Arc::new(RecordingSleeper::default());

        let error = executor(&transport, &sleeper, policy_503(1))
            .execute(&RequestMetadata::new(["teams"]))
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 2);
        assert!(error.is_transport());
        assert_eq!(error.status(), None);
        assert_eq!(error.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::repeating(Ok(RawResponse::new(
            StatusCode::NOT_FOUND,
            "",
        ))));
        let sleeper = Arc::new(RecordingSleeper::default());

        let error = executor(&transport, &sleeper, RetryPolicy::default())
            .execute(&RequestMetadata::new(["leagues", "999"]))
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert_eq!(error.status(), Some(StatusCode::NOT_FOUND));
        assert!(error.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_api_token_is_attached() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(ok_body(r#"{"data":[]}"#))]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let request = RequestMetadata::new(["leagues"]).with_query_param("page", "2");

        executor(&transport, &sleeper, RetryPolicy::none())
            .execute(&request)
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].query_params[API_TOKEN_PARAM], "secret");
        assert_eq!(sent[0].query_params["page"], "2");
    }

    #[tokio::test]
    async fn test_invalid_envelope_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::repeating(Ok(ok_body("not json"))));
        let sleeper = Arc::new(RecordingSleeper::default());

        let error = executor(&transport, &sleeper, RetryPolicy::default())
            .execute(&RequestMetadata::new(["leagues"]))
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert!(matches!(error, Error::Deserialization { .. }));
    }
}
