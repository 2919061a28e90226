//! Health endpoint payload

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body returned by `health` and `health/detailed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status string (e.g. `"healthy"`)
    pub status: String,
    /// Component checks, version info and anything else the server reports
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HealthReport {
    /// Returns `true` when the server reports `healthy` or `ok`
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.to_ascii_lowercase().as_str(), "healthy" | "ok")
    }
}
