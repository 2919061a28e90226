//! API-specific error types
//!
//! Every failure the API client can report, with accessors that expose the
//! status code, the server's error-type tag and the retry-after hint.

use std::time::Duration;

use opendata_domain::constants::RATE_LIMIT_ERROR_TYPE;
use opendata_domain::OpenDataError;
use reqwest::StatusCode;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Caller misuse (e.g. refresh without a refresh token) - never retried
    Usage,
    /// 401 - recoverable by refreshing the access token
    Authentication,
    /// 429 - recoverable by waiting
    RateLimit,
    /// 5xx
    Server,
    /// Other 4xx (and unexpected 3xx)
    Client,
    /// Connection/timeout failures from the transport
    Network,
    /// Malformed success bodies
    Protocol,
    /// Client construction problems
    Config,
    /// Retry loop ran out of attempts
    Exhausted,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Rate limit exceeded: {message} (retry after {retry_after:?})")]
    RateLimited { message: String, retry_after: Duration },

    #[error("{message} (HTTP {status})")]
    Status { message: String, status: u16, error_type: Option<String> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed after {attempts} retries")]
    RetriesExhausted { attempts: u32 },
}

impl ApiError {
    /// HTTP status associated with this error, if it came from a response
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error-type tag reported by the server
    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::RateLimited { .. } => Some(RATE_LIMIT_ERROR_TYPE),
            Self::Status { error_type, .. } => error_type.as_deref(),
            _ => None,
        }
    }

    /// Wait requested by the server before the next attempt
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Human-readable message without the status suffix
    pub fn message(&self) -> String {
        match self {
            Self::RateLimited { message, .. } | Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    pub fn is_not_modified(&self) -> bool {
        self.status() == Some(StatusCode::NOT_MODIFIED.as_u16())
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Usage(_) => ApiErrorCategory::Usage,
            Self::RateLimited { .. } => ApiErrorCategory::RateLimit,
            Self::Status { status, .. } => match *status {
                401 => ApiErrorCategory::Authentication,
                500..=599 => ApiErrorCategory::Server,
                _ => ApiErrorCategory::Client,
            },
            Self::Transport(_) => ApiErrorCategory::Network,
            Self::InvalidResponse(_) => ApiErrorCategory::Protocol,
            Self::Config(_) => ApiErrorCategory::Config,
            Self::RetriesExhausted { .. } => ApiErrorCategory::Exhausted,
        }
    }
}

/// Convert from the domain error to ApiError
impl From<OpenDataError> for ApiError {
    fn from(err: OpenDataError) -> Self {
        match err {
            OpenDataError::Config(message) => Self::Config(message),
            OpenDataError::InvalidInput(message) => Self::Usage(message),
            OpenDataError::Network(message) | OpenDataError::Internal(message) => {
                Self::Transport(message)
            }
        }
    }
}
