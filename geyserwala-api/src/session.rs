//! Bearer-token session with the device
//!
//! The session owns the token and the per-client request lock. Every request
//! goes through [`Session::lock`], so at most one request is in flight per
//! client and the token is read and invalidated consistently.
//!
//! State moves from unauthenticated to authenticated on a successful login and
//! back on logout or on any 401 answer. Login failures are reported as `false`
//! (or [`ApiError::Unauthorized`] from [`Session::run_authorized`]) and are
//! never retried here.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rest_client::{Endpoint, HttpTransport, Method, RestRequest};
use serde_json::{json, Value};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credentials::Password;
use crate::error::{ApiError, Result};

const SESSION_PATH: &str = "api/session";

/// A request to the device API, relative to the device root
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: Password,
}

/// Authenticated channel to one device
pub struct Session {
    transport: Arc<dyn HttpTransport>,
    endpoint: Endpoint,
    timeout: Duration,
    credentials: RwLock<Credentials>,
    token: RwLock<Option<String>>,
    request_lock: Mutex<()>,
}

impl Session {
    pub fn new(config: &ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            endpoint: config.endpoint(),
            timeout: config.request_timeout,
            credentials: RwLock::new(Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            }),
            token: RwLock::new(None),
            request_lock: Mutex::new(()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// True while a token is held
    pub fn authorized(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn username(&self) -> String {
        self.credentials.read().username.clone()
    }

    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn clear_token(&self) {
        self.token.write().take();
    }

    /// Log in with new credentials, remembering them for later re-logins
    pub async fn login(&self, username: impl Into<String>, password: impl Into<Password>) -> bool {
        let credentials = Credentials {
            username: username.into(),
            password: password.into(),
        };
        *self.credentials.write() = credentials.clone();
        self.authenticate(credentials).await
    }

    async fn authenticate(&self, credentials: Credentials) -> bool {
        let secret = credentials.password.resolve().await;
        let body = json!({"username": credentials.username, "password": secret});

        let response = match self.request(ApiRequest::post(SESSION_PATH, body)).await {
            Ok(Some(response)) if !is_empty_payload(&response) => response,
            Ok(_) => {
                debug!("Empty response to auth request");
                self.clear_token();
                return false;
            }
            Err(e) => {
                debug!("Auth request failed: {}", e);
                self.clear_token();
                return false;
            }
        };

        let Some(success) = response.get("success") else {
            warn!("Malformed response to auth request: missing 'success'");
            return false;
        };
        if success != &Value::Bool(true) {
            return false;
        }
        match response.get("token").and_then(Value::as_str) {
            Some(token) => {
                *self.token.write() = Some(token.to_string());
                true
            }
            None => {
                warn!("Malformed response to auth request: missing 'token'");
                false
            }
        }
    }

    /// End the session on the device
    pub async fn logout(&self) -> bool {
        match self.request(ApiRequest::delete(SESSION_PATH)).await {
            Ok(Some(response)) if response.get("success") == Some(&Value::Bool(true)) => {
                self.clear_token();
                true
            }
            Ok(_) => false,
            Err(e) => {
                debug!("Logout request failed: {}", e);
                false
            }
        }
    }

    /// Log in with the stored credentials unless a token is already held
    pub async fn ensure_authorized(&self) -> Result<()> {
        if self.authorized() {
            return Ok(());
        }
        let credentials = self.credentials.read().clone();
        if self.authenticate(credentials).await {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    /// Run `operation` with a valid session, logging in first if needed
    ///
    /// Concurrent callers may both log in; the last token written wins.
    pub async fn run_authorized<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.ensure_authorized().await?;
        operation().await
    }

    /// Take the request lock; released when the guard drops
    pub async fn lock(&self) -> RequestGuard<'_> {
        RequestGuard {
            session: self,
            _permit: self.request_lock.lock().await,
        }
    }

    /// Send one request under the request lock
    pub async fn request(&self, request: ApiRequest) -> Result<Option<Value>> {
        self.lock().await.send(request).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("authorized", &self.authorized())
            .finish()
    }
}

/// Proof that the request lock is held
pub struct RequestGuard<'a> {
    session: &'a Session,
    _permit: MutexGuard<'a, ()>,
}

impl RequestGuard<'_> {
    /// Send a request and map the device's status to a result
    ///
    /// 200 yields the decoded body (`None` when empty). 401 clears the token
    /// before failing with `Unauthorized`. Any other status is `Status`.
    pub async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        let session = self.session;
        let url = session.endpoint.url(&request.path)?;
        debug!(
            "req: {} {} {:?} {:?}",
            request.method, request.path, request.query, request.body
        );

        let mut rest = RestRequest::new(request.method, url)
            .with_bearer(session.token())
            .with_timeout(session.timeout);
        for (key, value) in request.query {
            rest = rest.with_query(key, value);
        }
        if let Some(body) = request.body {
            rest = rest.with_body(body);
        }

        let response = session.transport.send(rest).await?;
        match response.status {
            200 => Ok(response.body),
            401 => {
                session.clear_token();
                Err(ApiError::Unauthorized)
            }
            status => Err(ApiError::Status(status)),
        }
    }
}

/// Whether a payload counts as "nothing came back"
pub(crate) fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}
