//! Client configuration
//!
//! [`ClientConfig`] holds everything needed to reach and log in to one
//! device. Defaults match the device firmware: plain HTTP on port 80, user
//! `admin` with an empty password, a 10 second request timeout and a 500 ms
//! cache window.

use std::time::Duration;

use geyserwala_discovery::Device;
use rest_client::Endpoint;

use crate::credentials::{CredentialProvider, Password};

/// Configuration for a [`GeyserwalaClient`](crate::GeyserwalaClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host name or IP address of the device
    pub host: String,

    /// HTTP port
    /// Default: 80
    pub port: u16,

    /// URL scheme
    /// Default: "http"
    pub scheme: String,

    /// Login user name
    /// Default: "admin"
    pub username: String,

    /// Login password, resolved at login time
    /// Default: empty
    pub password: Password,

    /// Per-request timeout
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// Maximum age of cached values before `update()` goes to the network
    /// Default: 500 ms
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// Configuration for `host` with all other values defaulted
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 80,
            scheme: "http".to_string(),
            username: "admin".to_string(),
            password: Password::default(),
            request_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_millis(500),
        }
    }

    /// Configuration for a device found by mDNS discovery
    pub fn from_device(device: &Device) -> Self {
        Self::new(device.address.clone()).with_port(device.port)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<Password>) -> Self {
        self.password = password.into();
        self
    }

    /// Use a deferred password source
    pub fn with_credential_provider(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.password = Password::new(provider);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.scheme.clone(), self.host.clone(), self.port)
    }
}
