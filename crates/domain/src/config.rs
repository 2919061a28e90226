//! Client configuration structures
//!
//! Every field has a default so partial JSON/TOML files deserialize.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE, DEFAULT_LOW_HEADROOM_PAUSE_SECS,
    DEFAULT_LOW_HEADROOM_THRESHOLD, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT_SECS,
};

/// Top-level configuration for the API client and its policy wrappers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL including the API prefix (e.g. `http://localhost:3000/api/v1`)
    pub base_url: String,
    /// Initial access token
    pub access_token: Option<String>,
    /// Initial refresh token
    pub refresh_token: Option<String>,
    /// Transport timeout per request
    pub timeout_secs: u64,
    /// Optional `User-Agent` header value
    pub user_agent: Option<String>,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            refresh_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            retry: RetryConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Transport timeout as a [`Duration`]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the single-resource retry wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, rate-limit waits included
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

/// Settings for the batch fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of paths per group
    pub batch_size: usize,
    /// Pause between groups when `remaining` drops below this value
    pub low_headroom_threshold: u64,
    /// Length of the low-headroom pause in seconds
    pub pause_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            low_headroom_threshold: DEFAULT_LOW_HEADROOM_THRESHOLD,
            pause_secs: DEFAULT_LOW_HEADROOM_PAUSE_SECS,
        }
    }
}

impl BatchConfig {
    /// Low-headroom pause as a [`Duration`]
    pub const fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_secs)
    }
}
