//! # OpenData Domain
//!
//! Data types shared by the Open Data API client.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Client configuration structures
//! - Wire types (token pair, data envelope, health report)
//! - The rate-limit snapshot reported by the server
//!
//! ## Architecture
//! - No dependencies on other OpenData crates
//! - No I/O; everything here is plain data

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
