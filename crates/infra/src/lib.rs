//! # Open Data Infrastructure
//!
//! I/O-side implementation of the Open Data API client.
//!
//! This crate contains:
//! - The HTTP transport adapter over `reqwest`
//! - The API client with token handling and rate-limit tracking
//! - Retry, batch and conditional-cache policy wrappers
//! - Configuration loading from the environment or files
//!
//! ## Architecture
//! - Depends on `opendata-domain` for configuration and wire types
//! - Policy wrappers talk to the client only through [`api::DataApi`]

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{
    fetch_multiple, fetch_with_retry, ApiClient, ApiClientBuilder, ApiError, ApiErrorCategory,
    BatchFetcher, ConditionalCache, DataApi, FetchOutcome, RetryingFetcher, Sleeper, TokioSleeper,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
