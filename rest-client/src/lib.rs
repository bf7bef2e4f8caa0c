//! Private JSON REST transport for Geyserwala device communication
//!
//! This crate provides the pooled HTTP layer the API crate sends its requests
//! through. It knows nothing about sessions or device keys: a request goes out
//! with JSON headers and an optional bearer token, and whatever status and JSON
//! body come back are returned untouched.
//!
//! The [`HttpTransport`] trait is the seam between the two crates so callers
//! can substitute their own transport (or a scripted one in tests).

mod error;

pub use error::RestError;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Default per-request timeout used by the device API
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP methods used by the device REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Network location of a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Root URL of the device, e.g. `http://192.168.1.20/`
    pub fn base_url(&self) -> Result<Url, RestError> {
        Ok(Url::parse(&format!(
            "{}://{}:{}/",
            self.scheme, self.host, self.port
        ))?)
    }

    /// Resolve an API path (e.g. `api/value/timer/3`) against the device root
    pub fn url(&self, path: &str) -> Result<Url, RestError> {
        Ok(self.base_url()?.join(path.trim_start_matches('/'))?)
    }
}

/// A single JSON request to a device
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
    pub timeout: Duration,
}

impl RestRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            body: None,
            bearer: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Status and decoded body of a device response
///
/// `body` is only decoded for HTTP 200; an empty 200 body is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl RestResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Something that can carry a [`RestRequest`] to a device
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: RestRequest) -> Result<RestResponse, RestError>;
}

/// Pooled HTTP transport backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct RestClient {
    http: reqwest::Client,
}

impl RestClient {
    /// Create a new REST client with its own connection pool
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Create a REST client sharing an existing `reqwest` connection pool
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpTransport for RestClient {
    async fn send(&self, request: RestRequest) -> Result<RestResponse, RestError> {
        debug!(
            method = %request.method,
            url = %request.url,
            query = ?request.query,
            body = ?request.body,
            "req"
        );

        let mut builder = self
            .http
            .request(request.method.into(), request.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Ok(RestResponse::new(status, None));
        }

        let bytes = response.bytes().await?;
        Ok(RestResponse::new(status, decode_body(&bytes)?))
    }
}

fn decode_body(bytes: &[u8]) -> Result<Option<Value>, RestError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| RestError::Decode(e.to_string()))
}
