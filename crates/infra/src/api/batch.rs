//! Sequential batch fetching with cooperative rate-limit backoff
//!
//! Paths are fetched one at a time in fixed-size groups. A failing path is
//! recorded and skipped; it never aborts the batch. Between groups the
//! fetcher pauses when the server reports little rate-limit headroom.

use std::sync::Arc;

use opendata_domain::BatchConfig;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::client::DataApi;
use super::sleeper::{Sleeper, TokioSleeper};

/// Result of fetching one path in a batch
///
/// A 304 Not Modified still counts as fetched, with neither data nor etag.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched { path: String, data: Option<Value>, etag: Option<String> },
    Failed { path: String, error: String },
}

impl FetchOutcome {
    pub fn path(&self) -> &str {
        match self {
            Self::Fetched { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Fetched { data, .. } => data.as_ref(),
            Self::Failed { .. } => None,
        }
    }

    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::Fetched { etag, .. } => etag.as_deref(),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Fetched { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Serialized as `{path, data, etag, success: true}` or
/// `{path, error, success: false}`
impl Serialize for FetchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Fetched { path, data, etag } => {
                let mut state = serializer.serialize_struct("FetchOutcome", 4)?;
                state.serialize_field("path", path)?;
                state.serialize_field("data", data)?;
                state.serialize_field("etag", etag)?;
                state.serialize_field("success", &true)?;
                state.end()
            }
            Self::Failed { path, error } => {
                let mut state = serializer.serialize_struct("FetchOutcome", 3)?;
                state.serialize_field("path", path)?;
                state.serialize_field("error", error)?;
                state.serialize_field("success", &false)?;
                state.end()
            }
        }
    }
}

/// Batch fetcher over any [`DataApi`]
pub struct BatchFetcher {
    config: BatchConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl BatchFetcher {
    pub fn new(config: BatchConfig) -> Self {
        Self { config, sleeper: Arc::new(TokioSleeper) }
    }

    /// Replace the sleeper used for low-headroom pauses
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Fetch every path, returning one outcome per path in input order
    #[instrument(skip_all, fields(count = paths.len(), batch_size = self.config.batch_size))]
    pub async fn fetch_multiple<C, P>(&self, client: &mut C, paths: &[P]) -> Vec<FetchOutcome>
    where
        C: DataApi + ?Sized,
        P: AsRef<str>,
    {
        let batch_size = self.config.batch_size.max(1);
        let batch_count = paths.len().div_ceil(batch_size);
        let mut outcomes = Vec::with_capacity(paths.len());

        for (batch_idx, chunk) in paths.chunks(batch_size).enumerate() {
            debug!(batch = batch_idx + 1, of = batch_count, "Fetching batch");

            for path in chunk {
                let path = path.as_ref();
                let outcome = match client.get_data(path, None).await {
                    Ok(result) => {
                        let (data, etag) = result.into_parts();
                        FetchOutcome::Fetched { path: path.to_string(), data, etag }
                    }
                    Err(err) => {
                        debug!(path, error = %err, "Batch item failed");
                        FetchOutcome::Failed { path: path.to_string(), error: err.to_string() }
                    }
                };
                outcomes.push(outcome);
            }

            let is_last = batch_idx + 1 == batch_count;
            if !is_last && client.rate_limit().is_below(self.config.low_headroom_threshold) {
                warn!(
                    remaining = ?client.rate_limit().remaining,
                    pause_secs = self.config.pause_secs,
                    "Rate limit low, pausing before next batch"
                );
                self.sleeper.sleep(self.config.pause()).await;
            }
        }

        let failed = outcomes.iter().filter(|outcome| !outcome.is_success()).count();
        if failed > 0 {
            warn!(fetched = outcomes.len() - failed, failed, "Batch fetch completed with errors");
        } else {
            info!(fetched = outcomes.len(), "Batch fetch successful");
        }

        outcomes
    }
}

/// Fetch `paths` in groups of `batch_size` with the default headroom policy
pub async fn fetch_multiple<C, P>(
    client: &mut C,
    paths: &[P],
    batch_size: usize,
) -> Vec<FetchOutcome>
where
    C: DataApi + ?Sized,
    P: AsRef<str>,
{
    let config = BatchConfig { batch_size, ..BatchConfig::default() };
    BatchFetcher::new(config).fetch_multiple(client, paths).await
}
