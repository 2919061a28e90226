//! Application constants
//!
//! Wire-level names and policy defaults shared by the client and its
//! configuration.

// Endpoint defaults
pub const DEFAULT_BASE_URL: &str = "https://api.example.com/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Paths relative to the API prefix
pub const DATA_PATH_PREFIX: &str = "data/";
pub const AUTH_REFRESH_PATH: &str = "auth/refresh";
pub const AUTH_LOGOUT_PATH: &str = "auth/logout";
pub const HEALTH_PATH: &str = "../health";
pub const HEALTH_DETAILED_PATH: &str = "../health/detailed";

// Response headers
pub const HEADER_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Wait applied to a 429 response that carries no usable `Retry-After`
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Type tag reported for every 429 response
pub const RATE_LIMIT_ERROR_TYPE: &str = "rate-limit-exceeded";

// Policy defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_LOW_HEADROOM_THRESHOLD: u64 = 10;
pub const DEFAULT_LOW_HEADROOM_PAUSE_SECS: u64 = 5;
