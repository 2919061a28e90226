//! Scripted collaborators for the policy-wrapper tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use opendata_domain::{Conditional, RateLimitState, TokenPair};
use serde_json::Value;

use super::client::DataApi;
use super::errors::ApiError;
use super::sleeper::Sleeper;

/// Records every requested wait instead of sleeping
#[derive(Debug, Default)]
pub(crate) struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

struct Step {
    result: Result<Conditional<Value>, ApiError>,
    remaining: Option<u64>,
}

/// [`DataApi`] fake that replays scripted `get_data` results in order
#[derive(Default)]
pub(crate) struct ScriptedApi {
    steps: VecDeque<Step>,
    refresh_results: VecDeque<Result<TokenPair, ApiError>>,
    rate_limit: RateLimitState,
    pub(crate) calls: Vec<(String, Option<String>)>,
    pub(crate) refreshes: usize,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then(self, result: Result<Conditional<Value>, ApiError>) -> Self {
        self.then_with_remaining(result, None)
    }

    /// Script a result that also reports `X-RateLimit-Remaining`
    pub(crate) fn then_with_remaining(
        mut self,
        result: Result<Conditional<Value>, ApiError>,
        remaining: Option<u64>,
    ) -> Self {
        self.steps.push_back(Step { result, remaining });
        self
    }

    pub(crate) fn then_refresh(mut self, result: Result<TokenPair, ApiError>) -> Self {
        self.refresh_results.push_back(result);
        self
    }
}

#[async_trait]
impl DataApi for ScriptedApi {
    async fn get_data(
        &mut self,
        path: &str,
        etag: Option<&str>,
    ) -> Result<Conditional<Value>, ApiError> {
        self.calls.push((path.to_string(), etag.map(str::to_string)));
        let step = self.steps.pop_front().expect("unscripted get_data call");
        self.rate_limit.merge(None, step.remaining, None);
        step.result
    }

    async fn refresh_access_token(&mut self) -> Result<TokenPair, ApiError> {
        self.refreshes += 1;
        self.refresh_results.pop_front().expect("unscripted refresh call")
    }

    fn rate_limit(&self) -> &RateLimitState {
        &self.rate_limit
    }
}

pub(crate) fn fresh(data: Value, etag: &str) -> Result<Conditional<Value>, ApiError> {
    Ok(Conditional::Modified { data, etag: etag.to_string() })
}

pub(crate) fn status(status: u16, message: &str) -> ApiError {
    ApiError::Status { message: message.to_string(), status, error_type: None }
}

pub(crate) fn rate_limited(secs: u64) -> ApiError {
    ApiError::RateLimited {
        message: "Too many requests".to_string(),
        retry_after: Duration::from_secs(secs),
    }
}

pub(crate) fn token_pair(access: &str, refresh: &str) -> TokenPair {
    TokenPair { access_token: access.to_string(), refresh_token: refresh.to_string() }
}
