//! # sportmonks - a typed client for the SportMonks football API
//!
//! Builds SportMonks queries fluently, sends them with retries and rate-limit
//! awareness, and normalizes every failure into one error type.
//!
//! ## Quick Start
//!
//! ```no_run
//! use serde::Deserialize;
//! use sportmonks::{Envelope, SportMonksClient};
//!
//! #[derive(Deserialize)]
//! struct League {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sportmonks::Error> {
//!     let client = SportMonksClient::builder()
//!         .api_token("my-token")
//!         .build()?;
//!
//!     // One page of leagues, with their country embedded
//!     let response = client
//!         .leagues()
//!         .all()
//!         .include(["country"])
//!         .select(["id", "name"])
//!         .per_page(25)
//!         .get::<League>()
//!         .await?;
//!
//!     if let Envelope::Paginated(page) = &response.data {
//!         for league in &page.data {
//!             println!("{}: {}", league.id, league.name);
//!         }
//!     }
//!
//!     // Every team matching a search, across all pages
//!     let teams = client
//!         .teams()
//!         .search("Celtic")?
//!         .get_all::<serde_json::Value>()
//!         .await?;
//!     println!("{} teams", teams.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Fluent queries** - includes (with field subsets and nesting), filters, field selection, sorting and pagination
//! - **Retries** - exponential backoff over a configurable set of status codes; connection failures always retried
//! - **Rate-limit aware** - 429 responses wait exactly as long as the API says before retrying
//! - **One error type** - every HTTP failure becomes an [`ApiError`] with a [`kind`](ApiError::kind), status and upstream details
//! - **Typed envelopes** - single and paginated payloads are distinct [`Envelope`] variants
//! - **Logging** - structured `tracing` events for each attempt, retry and failure
//!
//! ## Error Handling
//!
//! ```no_run
//! use sportmonks::{ApiErrorKind, Error, SportMonksClient};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = SportMonksClient::builder().api_token("token").build()?;
//! match client.fixtures().by_date("2024-05-19")?.get::<serde_json::Value>().await {
//!     Ok(response) => println!("Fixtures: {:?}", response.data),
//!     Err(Error::Api(api)) => match api.kind {
//!         ApiErrorKind::RateLimited => eprintln!("Slow down: {}", api.message),
//!         ApiErrorKind::Forbidden => eprintln!("Check your plan: {}", api.message),
//!         _ => eprintln!("API error {:?}: {}", api.status, api.message),
//!     },
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod executor;
pub mod metadata;
pub mod params;
mod query;
pub mod rate_limit;
mod resource;
mod response;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{
    ClientBuilder, SportMonksClient, API_TOKEN_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
};
pub use error::{ApiError, ApiErrorKind, Error, Result};
pub use executor::{RequestExecutor, API_TOKEN_PARAM};
pub use params::{Include, IntoFilterValue, QueryOptions};
pub use query::QueryBuilder;
pub use resource::{Resource, MIN_SEARCH_LENGTH};
pub use response::{
    Envelope, EnvelopeMeta, PaginatedResponse, Pagination, RateLimit, RawEnvelope, Response,
    SingleResponse,
};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
