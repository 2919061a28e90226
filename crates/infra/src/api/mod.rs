//! Open Data API client and its policy wrappers
//!
//! [`ApiClient`] performs single requests. [`RetryingFetcher`],
//! [`BatchFetcher`] and [`ConditionalCache`] layer recovery on top of any
//! [`DataApi`] implementation.
//!
//! All waits go through [`Sleeper`] so tests can observe them without
//! blocking.

pub mod batch;
pub mod cache;
pub mod client;
pub mod credentials;
pub mod errors;
pub mod retry;
pub mod sleeper;

#[cfg(test)]
mod testing;

pub use batch::{fetch_multiple, BatchFetcher, FetchOutcome};
pub use cache::{CacheEntry, ConditionalCache};
pub use client::{ApiClient, ApiClientBuilder, DataApi, RequestOptions};
pub use credentials::{Credentials, SuppressedAccessToken};
pub use errors::{ApiError, ApiErrorCategory};
pub use retry::{fetch_with_retry, RetryingFetcher};
pub use sleeper::{Sleeper, TokioSleeper};
