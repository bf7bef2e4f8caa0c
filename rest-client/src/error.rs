//! Error types for the REST transport

use thiserror::Error;

/// Errors that can occur while talking to a device over HTTP
///
/// None of these carry an HTTP status: any response that arrived is handed
/// back to the caller as a [`RestResponse`](crate::RestResponse) so the API
/// layer can decide what a status means.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection, DNS or other HTTP-level failure
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The response body could not be decoded as JSON
    #[error("JSON decoding error: {0}")]
    Decode(String),

    /// The request URL could not be built from the endpoint and path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for RestError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RestError::Timeout
        } else if error.is_decode() {
            RestError::Decode(error.to_string())
        } else {
            RestError::Network(error.to_string())
        }
    }
}

impl From<url::ParseError> for RestError {
    fn from(error: url::ParseError) -> Self {
        RestError::InvalidUrl(error.to_string())
    }
}
