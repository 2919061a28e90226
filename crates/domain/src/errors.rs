//! Error types used throughout the application

use thiserror::Error;

/// Main error type for the OpenData workspace
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenDataError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for OpenData operations
pub type Result<T> = std::result::Result<T, OpenDataError>;
