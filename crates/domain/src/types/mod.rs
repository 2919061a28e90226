//! Domain types and models
//!
//! Wire shapes exchanged with the Open Data API plus the client-side
//! state derived from them.

pub mod auth;
pub mod data;
pub mod health;
pub mod rate_limit;

pub use auth::{RefreshRequest, TokenPair};
pub use data::{Conditional, DataEnvelope, DataMetadata};
pub use health::HealthReport;
pub use rate_limit::RateLimitState;
