//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use opendata_infra::api::{ApiClient, Sleeper};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "test-token";
pub const REFRESH_TOKEN: &str = "refresh-token";

/// Sleeper that records requested waits and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeper mutex poisoned").clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("sleeper mutex poisoned").push(duration);
    }
}

/// Client pointed at `<server>/api/v1` with both tokens set.
pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::builder()
        .base_url(format!("{}/api/v1", server.uri()))
        .access_token(ACCESS_TOKEN)
        .refresh_token(REFRESH_TOKEN)
        .build()
        .expect("client should build")
}

/// Data endpoint body carrying `data` and `etag`.
pub fn envelope(data: Value, etag: &str) -> Value {
    json!({ "data": data, "metadata": { "etag": etag } })
}

/// Install a `tracing` subscriber once so failing tests show client logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
