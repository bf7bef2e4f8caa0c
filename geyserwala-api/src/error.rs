use rest_client::RestError;
use thiserror::Error;

/// Errors surfaced by the Geyserwala client
///
/// Local validation failures (out-of-range setpoint, unknown mode) are not
/// errors: setters report them as `Ok(false)` without touching the network.
/// Everything here means a request was attempted and did not succeed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session: login failed, or the device answered 401
    ///
    /// A 401 clears the held token before this error is returned, so the next
    /// authorized call logs in again.
    #[error("Unauthorized")]
    Unauthorized,

    /// The device answered with a status other than 200 or 401
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Timeout, connection failure or undecodable body
    #[error("Request failed: {0}")]
    Request(#[from] RestError),

    /// The device answered 200 with a payload of the wrong shape
    #[error("Invalid response: {0}")]
    Response(String),
}

impl ApiError {
    /// True for the "request error" family: bad status or transport fault
    pub fn is_request_error(&self) -> bool {
        matches!(self, ApiError::Status(_) | ApiError::Request(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
