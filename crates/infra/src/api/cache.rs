//! ETag-aware response cache
//!
//! Remembers the last body and ETag per path and revalidates with
//! `If-None-Match`. A 304 serves the stored body; a 404 evicts it.

use std::collections::HashMap;

use opendata_domain::Conditional;
use serde_json::Value;
use tracing::{debug, instrument};

use super::client::DataApi;
use super::errors::ApiError;

/// A cached body together with the ETag it was served with
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub etag: String,
}

/// In-memory conditional cache keyed by data path
#[derive(Debug, Default)]
pub struct ConditionalCache {
    entries: HashMap<String, CacheEntry>,
}

impl ConditionalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch `key`, revalidating any cached copy
    ///
    /// Yields `None` only when the server answers 304 and nothing is cached.
    ///
    /// # Errors
    ///
    /// Propagates every client error except 304. A 404 also drops the
    /// cached entry.
    #[instrument(skip(self, client), fields(cached = self.entries.contains_key(key)))]
    pub async fn get<C>(&mut self, client: &mut C, key: &str) -> Result<Option<Value>, ApiError>
    where
        C: DataApi + ?Sized,
    {
        let etag = self.entries.get(key).map(|entry| entry.etag.clone());

        match client.get_data(key, etag.as_deref()).await {
            Ok(Conditional::NotModified { .. }) => {
                debug!(key, cached = self.entries.contains_key(key), "Not modified");
                Ok(self.entries.get(key).map(|entry| entry.value.clone()))
            }
            Ok(Conditional::Modified { data, etag }) => {
                debug!(key, %etag, "Caching fresh value");
                self.entries.insert(key.to_string(), CacheEntry { value: data.clone(), etag });
                Ok(Some(data))
            }
            Err(err) => {
                if err.is_not_found() && self.entries.remove(key).is_some() {
                    debug!(key, "Evicted cache entry for missing resource");
                }
                Err(err)
            }
        }
    }

    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Drop the cached copy of `key`, returning it if present
    pub fn invalidate(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
