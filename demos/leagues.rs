//! Example fetching leagues with includes, field selection and error handling.
//!
//! This example shows how to:
//! - Create a client from the environment
//! - Fetch a single entity and one page of a collection
//! - Read pagination and rate-limit metadata
//! - Handle normalized API errors
//!
//! Run with: `SPORTMONKS_API_TOKEN=... cargo run --example leagues`

use serde::Deserialize;
use sportmonks::{ApiErrorKind, ClientBuilder, Envelope, Error};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct League {
    id: u64,
    name: String,
    #[serde(default)]
    short_code: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("sportmonks=debug,leagues=info")
        .init();

    let client = ClientBuilder::from_env()?.build()?;

    println!("=== Single league ===");
    let response = client
        .leagues()
        .by_id(8)?
        .include(["country"])
        .get::<League>()
        .await?;

    if let Envelope::Single(single) = &response.data {
        println!("{}: {:?}", single.data.name, single.data.short_code);
    }
    println!("Attempts: {}, latency: {:?}", response.attempts, response.latency);

    println!("\n=== First page of leagues ===");
    let response = client
        .leagues()
        .all()
        .select(["id", "name", "short_code"])
        .order_by("name")
        .per_page(10)
        .get::<League>()
        .await?;

    if let Some(pagination) = response.pagination() {
        println!(
            "Page {} ({} of {} per page), more: {}",
            pagination.current_page, pagination.count, pagination.per_page, pagination.has_more
        );
    }
    if let Some(rate_limit) = &response.meta().rate_limit {
        println!("Requests remaining: {:?}", rate_limit.remaining);
    }
    for league in response.data.into_items() {
        println!("  {} {}", league.id, league.name);
    }

    println!("\n=== Error handling ===");
    match client.leagues().by_id(999_999_999)?.get::<League>().await {
        Ok(_) => println!("Unexpectedly found a league"),
        Err(Error::Api(api)) => match api.kind {
            ApiErrorKind::NotFound => println!("Not found: {}", api.message),
            ApiErrorKind::Forbidden => println!("Forbidden: {}", api.message),
            ApiErrorKind::RateLimited => println!("Rate limited: {}", api.message),
            _ => println!("API error {:?}: {}", api.status, api.message),
        },
        Err(e) => println!("Other error: {}", e),
    }

    match client.teams().search("ab") {
        Ok(_) => println!("Search accepted"),
        Err(e) => println!("Rejected locally: {}", e),
    }

    Ok(())
}
