//! Error types for the discovery system.

use thiserror::Error;

/// Error type for discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket setup or multicast query failure
    #[error("Network error: {0}")]
    Network(String),
}

impl From<mdns::Error> for DiscoveryError {
    fn from(error: mdns::Error) -> Self {
        DiscoveryError::Network(error.to_string())
    }
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
