//! Open Data API client
//!
//! Issues exactly one HTTP request per call: attaches the bearer token,
//! records the rate-limit headers of every response and maps non-2xx
//! statuses to [`ApiError`]. Recovery (waiting, refreshing, cache eviction)
//! is left to the policy wrappers in [`super::retry`], [`super::batch`] and
//! [`super::cache`].

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use opendata_domain::constants::{
    AUTH_LOGOUT_PATH, AUTH_REFRESH_PATH, DATA_PATH_PREFIX, DEFAULT_BASE_URL,
    DEFAULT_RETRY_AFTER_SECS, DEFAULT_TIMEOUT_SECS, HEADER_RATE_LIMIT_LIMIT,
    HEADER_RATE_LIMIT_REMAINING, HEADER_RATE_LIMIT_RESET, HEADER_RETRY_AFTER, HEALTH_DETAILED_PATH,
    HEALTH_PATH,
};
use opendata_domain::{
    ClientConfig, Conditional, DataEnvelope, HealthReport, RateLimitState, RefreshRequest,
    TokenPair,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, IF_NONE_MATCH};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::credentials::Credentials;
use super::errors::ApiError;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// The operations the policy wrappers need from a client
///
/// Implemented by [`ApiClient`]; tests substitute scripted fakes.
#[async_trait]
pub trait DataApi: Send {
    /// Conditional fetch of `data/<path>`
    async fn get_data(
        &mut self,
        path: &str,
        etag: Option<&str>,
    ) -> Result<Conditional<Value>, ApiError>;

    /// Exchange the refresh token for a new token pair
    async fn refresh_access_token(&mut self) -> Result<TokenPair, ApiError>;

    /// Rate-limit state observed on the most recent response
    fn rate_limit(&self) -> &RateLimitState;
}

/// Per-request extras: additional headers and an optional JSON body
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: HeaderMap,
    json: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request header
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send `body` as the JSON request body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

/// API client for the Open Data service
pub struct ApiClient {
    connection: Connection,
    credentials: Credentials,
}

/// Everything needed to put a request on the wire, kept apart from the
/// credentials so the two can be borrowed independently.
struct Connection {
    http: HttpClient,
    base_url: Url,
    rate_limit: RateLimitState,
}

impl ApiClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL is invalid or the HTTP
    /// client cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = Self::builder()
            .base_url(config.base_url.clone())
            .timeout(config.timeout());

        if let Some(token) = &config.access_token {
            builder = builder.access_token(token.clone());
        }
        if let Some(token) = &config.refresh_token {
            builder = builder.refresh_token(token.clone());
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        builder.build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Base URL all request paths are resolved against
    pub fn base_url(&self) -> &Url {
        &self.connection.base_url
    }

    /// Rate-limit state from the most recent response
    pub fn rate_limit(&self) -> &RateLimitState {
        &self.connection.rate_limit
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn has_access_token(&self) -> bool {
        self.credentials.access_token().is_some()
    }

    pub fn has_refresh_token(&self) -> bool {
        self.credentials.refresh_token().is_some()
    }

    /// Replace the stored tokens (e.g. after an out-of-band login)
    pub fn set_tokens(&mut self, access_token: Option<String>, refresh_token: Option<String>) {
        self.credentials = Credentials::new(access_token, refresh_token);
    }

    /// Send one request under the API prefix
    ///
    /// Returns `None` for 204 and empty 2xx bodies, the parsed JSON body
    /// otherwise.
    ///
    /// # Errors
    ///
    /// - [`ApiError::RateLimited`] for 429
    /// - [`ApiError::Status`] for any other non-2xx status
    /// - [`ApiError::Transport`] if no response was received
    /// - [`ApiError::InvalidResponse`] if a 2xx body is not JSON
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn request(
        &mut self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ApiError> {
        self.connection.send(&self.credentials, method, path, options).await
    }

    /// Exchange the refresh token for a new access/refresh token pair
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Usage`] without sending anything when no refresh
    /// token is stored; otherwise any request error.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&mut self) -> Result<TokenPair, ApiError> {
        let refresh_token = self
            .credentials
            .refresh_token()
            .ok_or_else(|| ApiError::Usage("Refresh token is required".to_string()))?;

        let body = serde_json::to_value(RefreshRequest { refresh_token })
            .map_err(|e| ApiError::Usage(format!("Failed to serialize refresh request: {e}")))?;

        let response =
            self.request(Method::POST, AUTH_REFRESH_PATH, RequestOptions::new().json(body)).await?;
        let pair: TokenPair = decode_body(response, "token refresh")?;

        self.credentials.replace(&pair);
        info!("Access token refreshed");
        Ok(pair)
    }

    /// Fetch `data/<path>`, conditionally when `etag` is given
    ///
    /// A 304 answer is not an error: it yields
    /// [`Conditional::NotModified`] carrying the same `etag`.
    ///
    /// # Errors
    ///
    /// Any request error other than 304, or [`ApiError::InvalidResponse`]
    /// when the body is not a data envelope
    #[instrument(skip_all, fields(path = %path, conditional = etag.is_some()))]
    pub async fn get_data(
        &mut self,
        path: &str,
        etag: Option<&str>,
    ) -> Result<Conditional<Value>, ApiError> {
        let mut options = RequestOptions::new();
        if let Some(tag) = etag {
            let value = HeaderValue::from_str(tag)
                .map_err(|e| ApiError::Usage(format!("Invalid entity tag '{tag}': {e}")))?;
            options = options.header(IF_NONE_MATCH, value);
        }

        let data_path = format!("{DATA_PATH_PREFIX}{}", path.trim_start_matches('/'));

        match self.request(Method::GET, &data_path, options).await {
            Ok(body) => {
                let envelope: DataEnvelope = decode_body(body, "data")?;
                debug!(etag = %envelope.metadata.etag, "Fetched fresh data");
                Ok(Conditional::Modified { data: envelope.data, etag: envelope.metadata.etag })
            }
            Err(err) if err.is_not_modified() => {
                debug!("Data not modified");
                Ok(Conditional::NotModified { etag: etag.map(str::to_string) })
            }
            Err(err) => Err(err),
        }
    }

    /// Notify the server and forget both tokens
    ///
    /// # Errors
    ///
    /// Propagates a failed notification; the tokens are kept in that case.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        self.request(Method::POST, AUTH_LOGOUT_PATH, RequestOptions::new()).await?;
        self.credentials.clear();
        info!("Logged out");
        Ok(())
    }

    /// Unauthenticated liveness probe against `health`
    ///
    /// # Errors
    ///
    /// Any request error, or [`ApiError::InvalidResponse`] for a body
    /// without `status`
    #[instrument(skip(self))]
    pub async fn check_health(&mut self) -> Result<HealthReport, ApiError> {
        self.unauthenticated_get(HEALTH_PATH).await
    }

    /// Unauthenticated probe against `health/detailed`
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::check_health`]
    #[instrument(skip(self))]
    pub async fn check_detailed_health(&mut self) -> Result<HealthReport, ApiError> {
        self.unauthenticated_get(HEALTH_DETAILED_PATH).await
    }

    async fn unauthenticated_get(&mut self, path: &str) -> Result<HealthReport, ApiError> {
        let response = {
            let credentials = self.credentials.suppress_access_token();
            self.connection.send(&credentials, Method::GET, path, RequestOptions::new()).await
        };
        decode_body(response?, "health")
    }
}

#[async_trait]
impl DataApi for ApiClient {
    async fn get_data(
        &mut self,
        path: &str,
        etag: Option<&str>,
    ) -> Result<Conditional<Value>, ApiError> {
        Self::get_data(self, path, etag).await
    }

    async fn refresh_access_token(&mut self) -> Result<TokenPair, ApiError> {
        Self::refresh_access_token(self).await
    }

    fn rate_limit(&self) -> &RateLimitState {
        Self::rate_limit(self)
    }
}

impl Connection {
    async fn send(
        &mut self,
        credentials: &Credentials,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ApiError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Usage(format!("Invalid request path '{path}': {e}")))?;

        debug!(url = %url, "API request");

        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .headers(options.headers);

        if let Some(token) = credentials.access_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &options.json {
            builder = builder.json(body);
        }

        let response = self.http.send(builder).await?;

        let status = response.status();
        let headers = response.headers().clone();
        self.update_rate_limit(&headers);

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read response body: {e}")))?;

        if status.is_success() {
            if status == StatusCode::NO_CONTENT || body.is_empty() {
                return Ok(None);
            }
            return serde_json::from_slice(&body)
                .map(Some)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {e}")));
        }

        Err(error_from_response(status, &headers, &body))
    }

    fn update_rate_limit(&mut self, headers: &HeaderMap) {
        let limit = parse_header::<u64>(headers, HEADER_RATE_LIMIT_LIMIT);
        let remaining = parse_header::<u64>(headers, HEADER_RATE_LIMIT_REMAINING);
        let reset = parse_header::<i64>(headers, HEADER_RATE_LIMIT_RESET)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        self.rate_limit.merge(limit, remaining, reset);
    }
}

/// Map a non-2xx response to an [`ApiError`]
fn error_from_response(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ApiError {
    let (message, error_type) = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => {
            let message = ["detail", "title"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str))
                .unwrap_or("Unknown error")
                .to_string();
            let error_type = fields
                .get("type")
                .and_then(Value::as_str)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string);
            (message, error_type)
        }
        _ => (format!("HTTP {} Error", status.as_u16()), None),
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = parse_header::<u64>(headers, HEADER_RETRY_AFTER).unwrap_or_else(|| {
            if headers.contains_key(HEADER_RETRY_AFTER) {
                warn!("Unparseable Retry-After header, using default");
            }
            DEFAULT_RETRY_AFTER_SECS
        });
        return ApiError::RateLimited { message, retry_after: Duration::from_secs(retry_after) };
    }

    if status != StatusCode::NOT_MODIFIED {
        debug!(status = status.as_u16(), error_type = ?error_type, "API returned error status");
    }

    ApiError::Status { message, status: status.as_u16(), error_type }
}

fn parse_header<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn decode_body<T: DeserializeOwned>(body: Option<Value>, what: &str) -> Result<T, ApiError> {
    let value =
        body.ok_or_else(|| ApiError::InvalidResponse(format!("Empty {what} response")))?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::InvalidResponse(format!("Unexpected {what} response: {e}")))
}

/// Builder for API client
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    transport_attempts: Option<usize>,
}

impl ApiClientBuilder {
    /// Base URL including the API prefix (e.g. `http://localhost:3000/api/v1`)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Transport timeout per request (default 30 seconds)
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Attempts for connection-level failures (default 1)
    #[must_use]
    pub fn transport_attempts(mut self, attempts: usize) -> Self {
        self.transport_attempts = Some(attempts);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL cannot be used or the
    /// HTTP client cannot be created
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let mut http = HttpClient::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
            .max_attempts(self.transport_attempts.unwrap_or(1));
        if let Some(agent) = self.user_agent {
            http = http.user_agent(agent);
        }
        let http =
            http.build().map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(ApiClient {
            connection: Connection { http, base_url, rate_limit: RateLimitState::default() },
            credentials: Credentials::new(self.access_token, self.refresh_token),
        })
    }
}

/// Parse the base URL and make sure relative joins stay under its last
/// path segment.
fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ApiError::from(InfraError::from(e).0))?;

    if url.cannot_be_a_base() {
        return Err(ApiError::Config(format!("Base URL cannot be used as a base: {raw}")));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
