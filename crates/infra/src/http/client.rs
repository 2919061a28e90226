use std::time::Duration;

use opendata_domain::OpenDataError;
use reqwest::{Client as ReqwestClient, IntoUrl, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF_DOUBLINGS: u32 = 8;

/// Transport used by the API client.
///
/// Every HTTP response is handed back untouched, whatever its status; only
/// connection failures and timeouts are retried, and only when
/// `max_attempts` allows it. Status handling belongs to the caller.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    backoff: Backoff,
}

/// Exponential delay between transport attempts, capped at 2^8 times the base.
#[derive(Debug, Clone, Copy)]
struct Backoff {
    base: Duration,
}

impl Backoff {
    fn delay(self, retry_number: usize) -> Duration {
        let doublings = u32::try_from(retry_number.saturating_sub(1))
            .unwrap_or(u32::MAX)
            .min(MAX_BACKOFF_DOUBLINGS);
        self.base.saturating_mul(1 << doublings)
    }
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Start a request on the underlying connection pool.
    pub fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send `builder`, retrying transport failures up to the attempt budget.
    ///
    /// # Errors
    ///
    /// `OpenDataError::Network` when no response arrives,
    /// `OpenDataError::InvalidInput` when the request cannot be built.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, OpenDataError> {
        let mut attempt = 1;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    OpenDataError::Internal("streaming request bodies cannot be resent".into())
                })?
                .build()
                .map_err(to_domain)?;

            let method = request.method().clone();
            let url = request.url().clone();

            match self.client.execute(request).await {
                Ok(response) => {
                    debug!(attempt, %method, %url, status = %response.status(), "HTTP response");
                    return Ok(response);
                }
                Err(err) if attempt < self.max_attempts && is_transient(&err) => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        attempt, %method, %url, error = %err, ?delay,
                        "Transport failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "Transport failure");
                    return Err(to_domain(err));
                }
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: 1,
            base_backoff: DEFAULT_BACKOFF,
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Overall per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts for connection failures and timeouts (at least 1).
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    ///
    /// Fails when the TLS backend cannot be initialised.
    pub fn build(self) -> Result<HttpClient, OpenDataError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        Ok(HttpClient {
            client: builder.build().map_err(to_domain)?,
            max_attempts: self.max_attempts,
            backoff: Backoff { base: self.base_backoff },
        })
    }
}

fn to_domain(err: reqwest::Error) -> OpenDataError {
    InfraError::from(err).into()
}

fn is_transient(err: &reqwest::Error) -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    if err.is_connect() {
        return true;
    }
    err.is_timeout()
}
