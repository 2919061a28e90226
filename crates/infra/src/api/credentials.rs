//! Token storage owned by the API client

use std::fmt;
use std::ops::Deref;

use opendata_domain::TokenPair;

/// Access and refresh tokens held by one [`ApiClient`](super::ApiClient)
#[derive(Clone, Default)]
pub struct Credentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self { access_token, refresh_token }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Replace both tokens with a freshly issued pair
    pub fn replace(&mut self, pair: &TokenPair) {
        self.access_token = Some(pair.access_token.clone());
        self.refresh_token = Some(pair.refresh_token.clone());
    }

    pub fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
    }

    /// Hide the access token until the returned guard is dropped
    pub fn suppress_access_token(&mut self) -> SuppressedAccessToken<'_> {
        let saved = self.access_token.take();
        SuppressedAccessToken { credentials: self, saved }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Credentials")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Scope guard returned by [`Credentials::suppress_access_token`]
///
/// Derefs to the credentials with no access token; restores the saved token
/// on drop, whichever way the scope is left.
pub struct SuppressedAccessToken<'a> {
    credentials: &'a mut Credentials,
    saved: Option<String>,
}

impl Deref for SuppressedAccessToken<'_> {
    type Target = Credentials;

    fn deref(&self) -> &Self::Target {
        self.credentials
    }
}

impl Drop for SuppressedAccessToken<'_> {
    fn drop(&mut self) {
        self.credentials.access_token = self.saved.take();
    }
}
