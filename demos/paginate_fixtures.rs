//! Example collecting every fixture in a date range across pages.
//!
//! This example shows how to:
//! - Configure a custom retry policy
//! - Build a query with nested includes and filters
//! - Fetch all pages with `get_all`
//!
//! Run with: `SPORTMONKS_API_TOKEN=... cargo run --example paginate_fixtures`

use sportmonks::{ClientBuilder, Error, Include, RetryPolicy};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("sportmonks=debug,paginate_fixtures=info")
        .init();

    let policy = RetryPolicy::builder()
        .max_retries(5)
        .base_delay(Duration::from_secs(1))
        .max_delay(Duration::from_secs(20))
        .jitter(true)
        .build();

    let client = ClientBuilder::from_env()?.retry_policy(policy).build()?;

    let fixtures = client
        .fixtures()
        .between("2024-05-01", "2024-05-19")?
        .with_includes([Include::new("participants")
            .nested(Include::new("country").fields(["name"]))])
        .include_fields("scores", ["score", "description"])
        .filter("fixtureLeagues", [8])
        .order_by("starting_at")
        .per_page(50)
        .get_all::<serde_json::Value>()
        .await?;

    println!("Fetched {} fixtures", fixtures.len());
    for fixture in fixtures.iter().take(5) {
        println!(
            "  {} {}",
            fixture["starting_at"].as_str().unwrap_or("?"),
            fixture["name"].as_str().unwrap_or("?")
        );
    }

    Ok(())
}
