//! Example: Walking through the Open Data API client
//!
//! Demonstrates basic and conditional fetches, error inspection, health
//! checks, the conditional cache and logout against a running server.
//!
//! # Setup
//!
//! 1. Point the client at a server:
//!
//!    ```bash
//!    export OPENDATA_BASE_URL=http://localhost:3000/api/v1
//!    export OPENDATA_ACCESS_TOKEN=...
//!    ```
//!
//! 2. Run this example:
//!
//!    ```bash
//!    cargo run --example open_data_walkthrough
//!    ```
//!
//! Set `RUST_LOG=debug` to see the client's tracing output.

use opendata_infra::api::{ApiClient, ConditionalCache, RetryingFetcher};
use opendata_infra::config;
use tracing_subscriber::EnvFilter;

const SAMPLE_PATH: &str = "sample.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("Open Data API Walkthrough");
    println!("=========================\n");

    let config = config::load()?;
    let mut client = ApiClient::new(&config)?;
    println!("Using API at {}\n", client.base_url());

    // Example 1: Basic fetch
    println!("1. Basic fetch of {SAMPLE_PATH}");
    let first = client.get_data(SAMPLE_PATH, None).await?;
    let etag = first.etag().map(str::to_string);
    if let Some(data) = first.data() {
        println!("   data: {data}");
    }
    println!("   etag: {}\n", etag.as_deref().unwrap_or("<none>"));

    // Example 2: Conditional re-fetch with the ETag we just received
    println!("2. Conditional re-fetch");
    let again = client.get_data(SAMPLE_PATH, etag.as_deref()).await?;
    if again.is_not_modified() {
        println!("   not modified, keep using the previous copy\n");
    } else {
        println!("   resource changed since the first fetch\n");
    }

    // Example 3: Inspecting errors
    println!("3. Error inspection");
    match client.get_data("does-not-exist.json", None).await {
        Ok(_) => println!("   unexpectedly found the resource\n"),
        Err(err) => {
            println!("   message:  {}", err.message());
            println!("   status:   {:?}", err.status());
            println!("   type:     {:?}", err.error_type());
            println!("   category: {:?}\n", err.category());
        }
    }

    // Example 4: Health checks (sent without the access token)
    println!("4. Health check");
    match client.check_health().await {
        Ok(report) => println!("   status: {} (healthy: {})", report.status, report.is_healthy()),
        Err(err) => println!("   health check failed: {err}"),
    }
    match client.check_detailed_health().await {
        Ok(report) => println!("   detailed: {:?}\n", report.details),
        Err(err) => println!("   detailed health check failed: {err}\n"),
    }

    // Example 5: Retrying and cached fetches
    println!("5. Retrying and cached fetches");
    let fetcher = RetryingFetcher::from_config(&config.retry);
    match fetcher.fetch(&mut client, SAMPLE_PATH).await? {
        Some(value) => println!("   retrying fetch: {value}"),
        None => println!("   retrying fetch: not modified"),
    }

    let mut cache = ConditionalCache::new();
    cache.get(&mut client, SAMPLE_PATH).await?;
    match cache.get(&mut client, SAMPLE_PATH).await? {
        Some(cached) => println!("   cached fetch:   {cached}"),
        None => println!("   cached fetch:   nothing cached"),
    }
    println!("   rate limit:     {:?}\n", client.rate_limit());

    // Example 6: Logout
    println!("6. Logout");
    match client.logout().await {
        Ok(()) => println!("   logged out, tokens cleared"),
        Err(err) => println!("   logout failed, tokens kept: {err}"),
    }

    Ok(())
}
