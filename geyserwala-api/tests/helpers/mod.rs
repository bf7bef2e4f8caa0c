//! Shared fixtures for client tests
//!
//! [`ScriptedTransport`] answers requests from per-route queues so tests can
//! count exactly what went over the wire without a network.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use geyserwala_api::{ClientConfig, GeyserwalaClient, HttpTransport, Method, RestError, RestRequest, RestResponse};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const TOKEN: &str = "tok-1";

/// In-memory transport replaying scripted responses
///
/// Each (method, path) route has a queue of responses or transport errors.
/// Entries are taken in order and the last one repeats. Unscripted routes
/// answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(&'static str, String), VecDeque<Result<RestResponse, RestError>>>>,
    requests: Mutex<Vec<RestRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script a route; `path` is absolute, e.g. `/api/value`
    pub fn on(&self, method: Method, path: &str, response: RestResponse) -> &Self {
        self.push(method, path, Ok(response))
    }

    /// Script a transport failure such as a timeout
    pub fn on_error(&self, method: Method, path: &str, error: RestError) -> &Self {
        self.push(method, path, Err(error))
    }

    fn push(&self, method: Method, path: &str, outcome: Result<RestResponse, RestError>) -> &Self {
        self.routes
            .lock()
            .entry((method.as_str(), path.to_string()))
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn on_json(&self, method: Method, path: &str, body: Value) -> &Self {
        self.on(method, path, RestResponse::ok(body))
    }

    /// Accept logins with [`TOKEN`]
    pub fn accept_login(&self) -> &Self {
        self.on_json(Method::Post, "/api/session", json!({"success": true, "token": TOKEN}))
    }

    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests sent to a route
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.url.path() == path)
            .count()
    }

    pub fn total(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests sent to a route, oldest first
    pub fn sent(&self, method: Method, path: &str) -> Vec<RestRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.url.path() == path)
            .cloned()
            .collect()
    }

    fn next_outcome(&self, request: &RestRequest) -> Result<RestResponse, RestError> {
        let mut routes = self.routes.lock();
        match routes.get_mut(&(request.method.as_str(), request.url.path().to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(not_found),
            Some(queue) => queue.front().cloned().unwrap_or_else(not_found),
            None => not_found(),
        }
    }
}

fn not_found() -> Result<RestResponse, RestError> {
    Ok(RestResponse::new(404, None))
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: RestRequest) -> Result<RestResponse, RestError> {
        self.requests.lock().push(request.clone());
        // Let other tasks interleave the way a real round trip would
        tokio::task::yield_now().await;
        self.next_outcome(&request)
    }
}

/// Client backed by `transport` with the default 500 ms cache window
pub fn client_with(transport: &Arc<ScriptedTransport>) -> GeyserwalaClient {
    GeyserwalaClient::with_transport(
        ClientConfig::new("geyserwala.test").with_password("secret"),
        transport.clone(),
    )
}

/// Configuration pointing at a mockito server
pub fn mock_config(server: &mockito::ServerGuard) -> ClientConfig {
    let host_with_port = server.host_with_port();
    let (host, port) = host_with_port
        .rsplit_once(':')
        .expect("mockito address has a port");
    ClientConfig::new(host)
        .with_port(port.parse().expect("numeric port"))
        .with_password("secret")
}

/// A full status answer, as a device with a solar collector returns it
pub fn status_body() -> Value {
    json!({
        "id": "a1b2c3",
        "name": "Geyserwala",
        "version": "1.2.3",
        "time": "07:45",
        "features": {"f-collector": true, "f-pv-panel": false},
        "status": "Heating",
        "tank-temp": 45,
        "element-demand": true,
        "collector-temp": 62,
        "pump-status": false,
        "mode": "SETPOINT",
        "setpoint": 55,
        "setpoint-max": 65,
        "boost-demand": false,
        "external-setpoint": 30,
        "external-demand": 0,
        "external-disable": false
    })
}
