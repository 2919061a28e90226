//! Single-resource fetch with rate-limit backoff and re-authentication
//!
//! Every pass through the loop consumes one attempt, whether it ended in a
//! rate-limit wait or a token refresh.

use std::sync::Arc;

use opendata_domain::RetryConfig;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::client::DataApi;
use super::errors::ApiError;
use super::sleeper::{Sleeper, TokioSleeper};

/// Retry policy for fetching one data path
pub struct RetryingFetcher {
    max_attempts: u32,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingFetcher {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts, sleeper: Arc::new(TokioSleeper) }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts)
    }

    /// Replace the sleeper used for rate-limit waits
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fetch `path`, waiting out 429s and refreshing the token after a 401
    ///
    /// Yields `None` when the server answers 304 Not Modified.
    ///
    /// # Errors
    ///
    /// - the 401 itself if it happens on the final attempt
    /// - any error from the token refresh
    /// - any other error from the fetch, unchanged
    /// - [`ApiError::RetriesExhausted`] once every attempt was used up
    #[instrument(skip(self, client), fields(max_attempts = self.max_attempts))]
    pub async fn fetch<C>(&self, client: &mut C, path: &str) -> Result<Option<Value>, ApiError>
    where
        C: DataApi + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            match client.get_data(path, None).await {
                Ok(result) => return Ok(result.into_parts().0),
                Err(ApiError::RateLimited { retry_after, .. }) => {
                    warn!(
                        attempt,
                        retry_after_secs = retry_after.as_secs(),
                        "Rate limited, waiting"
                    );
                    self.sleeper.sleep(retry_after).await;
                }
                Err(err) if err.is_unauthorized() && attempt < self.max_attempts => {
                    info!(attempt, "Token expired, refreshing");
                    client.refresh_access_token().await?;
                }
                Err(err) => return Err(err),
            }
        }

        Err(ApiError::RetriesExhausted { attempts: self.max_attempts })
    }
}

/// Fetch `path` with up to `max_attempts` attempts, sleeping on the tokio
/// timer
///
/// # Errors
///
/// See [`RetryingFetcher::fetch`]
pub async fn fetch_with_retry<C>(
    client: &mut C,
    path: &str,
    max_attempts: u32,
) -> Result<Option<Value>, ApiError>
where
    C: DataApi + ?Sized,
{
    RetryingFetcher::new(max_attempts).fetch(client, path).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use opendata_domain::Conditional;
    use serde_json::json;

    use super::*;
    use crate::api::testing::{
        fresh, rate_limited, status, token_pair, RecordingSleeper, ScriptedApi,
    };

    fn fetcher(max_attempts: u32) -> (RetryingFetcher, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        (RetryingFetcher::new(max_attempts).with_sleeper(sleeper.clone()), sleeper)
    }

    #[tokio::test]
    async fn returns_data_on_first_success() {
        let mut api = ScriptedApi::new().then(fresh(json!({ "v": 1 }), "e1"));
        let (fetcher, sleeper) = fetcher(3);

        let data = fetcher.fetch(&mut api, "a.json").await.unwrap();

        assert_eq!(data, Some(json!({ "v": 1 })));
        assert_eq!(api.calls, vec![("a.json".to_string(), None)]);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn refreshes_once_after_401_and_returns_second_result() {
        let mut api = ScriptedApi::new()
            .then(Err(status(401, "Unauthorized")))
            .then(fresh(json!("second"), "e2"))
            .then_refresh(Ok(token_pair("a2", "r2")));
        let (fetcher, _) = fetcher(3);

        let data = fetcher.fetch(&mut api, "a.json").await.unwrap();

        assert_eq!(data, Some(json!("second")));
        assert_eq!(api.refreshes, 1);
        assert_eq!(api.calls.len(), 2);
    }

    #[tokio::test]
    async fn unauthorized_on_final_attempt_is_returned() {
        let mut api = ScriptedApi::new()
            .then(Err(status(401, "Unauthorized")))
            .then(Err(status(401, "Still unauthorized")))
            .then_refresh(Ok(token_pair("a2", "r2")));
        let (fetcher, _) = fetcher(2);

        let err = fetcher.fetch(&mut api, "a.json").await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(err.message(), "Still unauthorized");
        assert_eq!(api.refreshes, 1);
    }

    #[tokio::test]
    async fn refresh_failure_propagates() {
        let mut api = ScriptedApi::new()
            .then(Err(status(401, "Unauthorized")))
            .then_refresh(Err(ApiError::Usage("Refresh token is required".into())));
        let (fetcher, _) = fetcher(3);

        let err = fetcher.fetch(&mut api, "a.json").await.unwrap_err();

        assert!(matches!(err, ApiError::Usage(_)));
        assert_eq!(api.calls.len(), 1);
    }

    #[tokio::test]
    async fn waits_retry_after_then_succeeds() {
        let mut api = ScriptedApi::new().then(Err(rate_limited(7))).then(fresh(json!(1), "e"));
        let (fetcher, sleeper) = fetcher(3);

        let data = fetcher.fetch(&mut api, "a.json").await.unwrap();

        assert_eq!(data, Some(json!(1)));
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(7)]);
        assert_eq!(api.refreshes, 0);
    }

    #[tokio::test]
    async fn rate_limit_waits_consume_attempts() {
        let mut api = ScriptedApi::new()
            .then(Err(rate_limited(1)))
            .then(Err(rate_limited(2)))
            .then(Err(rate_limited(3)));
        let (fetcher, sleeper) = fetcher(3);

        let err = fetcher.fetch(&mut api, "a.json").await.unwrap_err();

        assert!(matches!(err, ApiError::RetriesExhausted { attempts: 3 }));
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(3)]
        );
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let mut api = ScriptedApi::new().then(Err(status(404, "Not Found")));
        let (fetcher, _) = fetcher(3);

        let err = fetcher.fetch(&mut api, "a.json").await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(api.calls.len(), 1);
    }

    #[tokio::test]
    async fn zero_attempts_exhausts_immediately() {
        let mut api = ScriptedApi::new();
        let (fetcher, _) = fetcher(0);

        let err = fetcher.fetch(&mut api, "a.json").await.unwrap_err();

        assert!(matches!(err, ApiError::RetriesExhausted { attempts: 0 }));
        assert!(api.calls.is_empty());
    }

    #[tokio::test]
    async fn not_modified_yields_no_data() {
        let mut api = ScriptedApi::new().then(Ok(Conditional::NotModified { etag: None }));
        let (fetcher, sleeper) = fetcher(3);

        let data = fetcher.fetch(&mut api, "a.json").await.unwrap();

        assert_eq!(data, None);
        assert_eq!(api.calls.len(), 1);
        assert!(sleeper.sleeps().is_empty());
    }
}
