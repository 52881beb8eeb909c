//! The SportMonks client and its builder.
//!
//! [`SportMonksClient`] is the entry point: it owns the configured executor and
//! hands out [`Resource`]s. Use [`ClientBuilder`] to configure it.

use crate::{
    executor::RequestExecutor,
    params::DEFAULT_INCLUDE_SEPARATOR,
    resource::Resource,
    retry::{RetryPolicy, Sleeper, TokioSleeper},
    transport::{HttpTransport, Transport},
    Error, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.sportmonks.com/v3/football";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the API token, read by [`ClientBuilder::from_env`].
pub const API_TOKEN_ENV: &str = "SPORTMONKS_API_TOKEN";

/// Environment variable overriding the base URL, read by [`ClientBuilder::from_env`].
pub const BASE_URL_ENV: &str = "SPORTMONKS_BASE_URL";

/// A client for the SportMonks football API.
///
/// Cloning is cheap; clones share the connection pool and retry policy.
///
/// # Examples
///
/// ```no_run
/// use sportmonks::{RetryPolicy, SportMonksClient};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), sportmonks::Error> {
/// let client = SportMonksClient::builder()
///     .api_token("my-token")
///     .timeout(Duration::from_secs(10))
///     .retry_policy(RetryPolicy::builder().max_retries(5).build())
///     .build()?;
///
/// let league = client
///     .leagues()
///     .by_id(8)?
///     .include(["country", "currentSeason"])
///     .get::<serde_json::Value>()
///     .await?;
/// println!("{:?}", league.data);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SportMonksClient {
    executor: Arc<RequestExecutor>,
    include_separator: char,
}

impl SportMonksClient {
    /// Creates a new `ClientBuilder`.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The retry policy shared by every request from this client.
    pub fn retry_policy(&self) -> &RetryPolicy {
        self.executor.policy()
    }

    /// A resource rooted at an arbitrary base path.
    pub fn resource(&self, base_path: &str) -> Resource {
        Resource::new(self.executor.clone(), base_path, self.include_separator)
    }

    /// Leagues.
    pub fn leagues(&self) -> Resource {
        self.resource("leagues")
    }

    /// Seasons.
    pub fn seasons(&self) -> Resource {
        self.resource("seasons")
    }

    /// Teams.
    pub fn teams(&self) -> Resource {
        self.resource("teams")
    }

    /// Players.
    pub fn players(&self) -> Resource {
        self.resource("players")
    }

    /// Fixtures.
    pub fn fixtures(&self) -> Resource {
        self.resource("fixtures")
    }

    /// Venues.
    pub fn venues(&self) -> Resource {
        self.resource("venues")
    }

    /// Coaches.
    pub fn coaches(&self) -> Resource {
        self.resource("coaches")
    }

    /// Referees.
    pub fn referees(&self) -> Resource {
        self.resource("referees")
    }

    /// Live scores.
    pub fn livescores(&self) -> Resource {
        self.resource("livescores")
    }

    /// Standings.
    pub fn standings(&self) -> Resource {
        self.resource("standings")
    }
}

/// Builder for configuring and creating a [`SportMonksClient`].
///
/// # Examples
///
/// ```no_run
/// use sportmonks::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), sportmonks::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.sportmonks.com/v3/football")?
///     .api_token("my-token")
///     .timeout(Duration::from_secs(30))
///     .include_separator(',')
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    include_separator: char,
    retry_policy: RetryPolicy,
    transport: Option<Arc<dyn Transport>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            default_headers: HeaderMap::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            include_separator: DEFAULT_INCLUDE_SEPARATOR,
            retry_policy: RetryPolicy::default(),
            transport: None,
            sleeper: None,
        }
    }

    /// Creates a builder from `SPORTMONKS_API_TOKEN` and, if set,
    /// `SPORTMONKS_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token variable is missing or the base URL is invalid.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(API_TOKEN_ENV).map_err(|_| {
            Error::Configuration(format!("{API_TOKEN_ENV} environment variable not set"))
        })?;

        let builder = Self::new().api_token(token);
        match std::env::var(BASE_URL_ENV) {
            Ok(url) => builder.base_url(url),
            Err(_) => Ok(builder),
        }
    }

    /// Sets the API root. Defaults to [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the API token sent with every request.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the per-request timeout. Defaults to [`DEFAULT_TIMEOUT`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the character placed between include entries. Defaults to `;`.
    pub fn include_separator(mut self, separator: char) -> Self {
        self.include_separator = separator;
        self
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Routes requests through a custom transport instead of `reqwest`.
    ///
    /// The base URL, default headers and timeout only apply to the built-in transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the sleeper used for backoff and rate-limit waits.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Builds the configured client.
    ///
    /// # Errors
    ///
    /// Returns an error if no API token was provided or the HTTP client cannot
    /// be created.
    pub fn build(self) -> Result<SportMonksClient> {
        let api_token = self
            .api_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| Error::Configuration("API token is required".to_string()))?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let base_url = match self.base_url {
                    Some(url) => url,
                    None => Url::parse(DEFAULT_BASE_URL)?,
                };

                let http_client = reqwest::Client::builder()
                    .default_headers(self.default_headers)
                    .build()
                    .map_err(|e| {
                        Error::Configuration(format!("Failed to build HTTP client: {}", e))
                    })?;

                Arc::new(HttpTransport::new(http_client, base_url, self.timeout)?)
            }
        };

        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));

        tracing::debug!(
            include_separator = %self.include_separator,
            max_retries = self.retry_policy.max_retries(),
            "Building SportMonks client"
        );

        Ok(SportMonksClient {
            executor: Arc::new(RequestExecutor::new(
                transport,
                sleeper,
                self.retry_policy,
                api_token,
            )),
            include_separator: self.include_separator,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
