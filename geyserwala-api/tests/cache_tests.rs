//! Cache window, refresh coalescing and re-login after 401

mod helpers;

use std::time::Duration;

use geyserwala_api::{ApiError, ClientConfig, GeyserwalaClient, Method, RestResponse};
use helpers::{client_with, status_body, ScriptedTransport};
use serde_json::json;

fn uncached_client(transport: &std::sync::Arc<ScriptedTransport>) -> GeyserwalaClient {
    GeyserwalaClient::with_transport(
        ClientConfig::new("geyserwala.test").with_cache_ttl(Duration::ZERO),
        transport.clone(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_updates_within_window_share_one_request() {
    let transport = ScriptedTransport::new();
    transport
        .accept_login()
        .on_json(Method::Get, "/api/value", status_body());
    let client = client_with(&transport);

    assert!(client.update_status().await.unwrap());
    assert!(client.update_status().await.unwrap());
    assert!(client.update().await.unwrap());
    assert_eq!(transport.count(Method::Get, "/api/value"), 1);

    tokio::time::advance(Duration::from_millis(501)).await;
    assert!(client.update_status().await.unwrap());
    assert_eq!(transport.count(Method::Get, "/api/value"), 2);
}

#[tokio::test]
async fn test_zero_ttl_always_fetches() {
    let transport = ScriptedTransport::new();
    transport
        .accept_login()
        .on_json(Method::Get, "/api/value", status_body());
    let client = uncached_client(&transport);

    client.update_status().await.unwrap();
    client.update_status().await.unwrap();
    assert_eq!(transport.count(Method::Get, "/api/value"), 2);
}

#[tokio::test]
async fn test_partial_answer_keeps_other_values() {
    let transport = ScriptedTransport::new();
    transport
        .accept_login()
        .on_json(Method::Get, "/api/value", status_body())
        .on_json(Method::Get, "/api/value", json!({"tank-temp": 47}));
    let client = uncached_client(&transport);

    client.update_status().await.unwrap();
    client.update_status().await.unwrap();

    assert_eq!(client.tank_temp(), 47);
    assert_eq!(client.name(), "Geyserwala");
    assert_eq!(client.setpoint(), Some(55));
}

#[tokio::test]
async fn test_concurrent_updates_coalesce() {
    let transport = ScriptedTransport::new();
    transport
        .accept_login()
        .on_json(Method::Get, "/api/value", status_body());
    let client = client_with(&transport);
    assert!(client.login("admin", "secret").await);

    let (first, second) = tokio::join!(client.update_status(), client.update_status());

    assert!(first.unwrap());
    assert!(second.unwrap());
    assert_eq!(transport.count(Method::Get, "/api/value"), 1);
    assert_eq!(transport.count(Method::Post, "/api/session"), 1);
}

#[tokio::test]
async fn test_empty_answer_is_not_fresh() {
    let transport = ScriptedTransport::new();
    transport
        .accept_login()
        .on_json(Method::Get, "/api/value", json!({}));
    let client = client_with(&transport);

    assert!(!client.update_status().await.unwrap());
    assert!(!client.cache().is_fresh());
    assert!(!client.update_status().await.unwrap());
    assert_eq!(transport.count(Method::Get, "/api/value"), 2);
}

#[tokio::test]
async fn test_unauthorized_answer_forces_single_relogin() {
    let transport = ScriptedTransport::new();
    transport
        .on_json(Method::Post, "/api/session", json!({"success": true, "token": "tok-1"}))
        .on_json(Method::Post, "/api/session", json!({"success": true, "token": "tok-2"}))
        .on(Method::Get, "/api/value", RestResponse::new(401, None))
        .on_json(Method::Get, "/api/value", status_body());
    let client = uncached_client(&transport);

    let result = client.update_status().await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert!(!client.authorized());

    assert!(client.update_status().await.unwrap());
    assert!(client.authorized());
    assert_eq!(transport.count(Method::Post, "/api/session"), 2);

    let gets = transport.sent(Method::Get, "/api/value");
    assert_eq!(gets[0].bearer.as_deref(), Some("tok-1"));
    assert_eq!(gets[1].bearer.as_deref(), Some("tok-2"));
}

#[tokio::test]
async fn test_non_object_answer_is_response_error() {
    let transport = ScriptedTransport::new();
    transport
        .accept_login()
        .on_json(Method::Get, "/api/value", json!("busy"));
    let client = client_with(&transport);

    assert!(matches!(client.update_status().await, Err(ApiError::Response(_))));
}
