//! Rate-limit snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent rate-limit information reported by the server
///
/// Each field is replaced only when the corresponding header is present on
/// a response; otherwise the previous value stays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    /// Requests allowed per window (`X-RateLimit-Limit`)
    pub limit: Option<u64>,
    /// Requests left in the current window (`X-RateLimit-Remaining`)
    pub remaining: Option<u64>,
    /// When the window resets (`X-RateLimit-Reset`, epoch seconds)
    pub reset: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Returns `true` when `remaining` is known and below `threshold`
    pub fn is_below(&self, threshold: u64) -> bool {
        self.remaining.is_some_and(|remaining| remaining < threshold)
    }

    /// Merge newly observed values, keeping fields that were not observed
    pub fn merge(
        &mut self,
        limit: Option<u64>,
        remaining: Option<u64>,
        reset: Option<DateTime<Utc>>,
    ) {
        if limit.is_some() {
            self.limit = limit;
        }
        if remaining.is_some() {
            self.remaining = remaining;
        }
        if reset.is_some() {
            self.reset = reset;
        }
    }
}
