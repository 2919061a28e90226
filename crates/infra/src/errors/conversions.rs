//! Conversions from external infrastructure errors into domain errors.

use opendata_domain::OpenDataError;
use reqwest::Error as HttpError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub OpenDataError);

impl From<InfraError> for OpenDataError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<OpenDataError> for InfraError {
    fn from(value: OpenDataError) -> Self {
        InfraError(value)
    }
}

trait IntoOpenDataError {
    fn into_opendata(self) -> OpenDataError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → OpenDataError */
/* -------------------------------------------------------------------------- */

impl IntoOpenDataError for HttpError {
    fn into_opendata(self) -> OpenDataError {
        if self.is_timeout() {
            return OpenDataError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return OpenDataError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return OpenDataError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        OpenDataError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_opendata())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → OpenDataError */
/* -------------------------------------------------------------------------- */

impl IntoOpenDataError for UrlError {
    fn into_opendata(self) -> OpenDataError {
        OpenDataError::Config(format!("invalid URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_opendata())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
