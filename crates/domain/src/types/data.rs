//! Data endpoint payloads and conditional-fetch results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body returned by `data/<path>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope {
    pub data: Value,
    pub metadata: DataMetadata,
}

/// Metadata block of a [`DataEnvelope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataMetadata {
    pub etag: String,
    /// Any further metadata the server sends (sizes, timestamps, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of a conditional fetch
///
/// `NotModified` carries exactly the entity tag that was sent, so a caller
/// can keep using it for the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional<T> {
    /// Server returned a fresh representation
    Modified { data: T, etag: String },
    /// Server answered 304 Not Modified
    NotModified { etag: Option<String> },
}

impl<T> Conditional<T> {
    /// Returns `true` for a 304 result
    pub const fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified { .. })
    }

    /// Fresh value, if any
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Modified { data, .. } => Some(data),
            Self::NotModified { .. } => None,
        }
    }

    /// Entity tag to use for the next conditional request
    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::Modified { etag, .. } => Some(etag),
            Self::NotModified { etag } => etag.as_deref(),
        }
    }

    /// Split into the `(value, entity tag)` pair
    pub fn into_parts(self) -> (Option<T>, Option<String>) {
        match self {
            Self::Modified { data, etag } => (Some(data), Some(etag)),
            Self::NotModified { etag } => (None, etag),
        }
    }
}
