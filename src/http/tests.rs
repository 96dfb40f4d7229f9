//! Tests for the HTTP transport module

use super::*;
use crate::config::SourceConfig;
use crate::error::Error;
use crate::types::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_transport_config_default() {
    let config = TransportConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.default_headers.is_empty());
    assert!(config.user_agent.starts_with("http-paginate/"));
}

#[test]
fn test_transport_config_builder() {
    let config = TransportConfig::builder()
        .timeout(Duration::from_secs(5))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_transport_config_from_source() {
    let mut source = SourceConfig::new("https://api.example.com");
    source.timeout_secs = 7;
    source.user_agent = Some("ingest/2.0".to_string());

    let config = TransportConfig::from_source(&source);
    assert_eq!(config.timeout, Duration::from_secs(7));
    assert_eq!(config.user_agent, "ingest/2.0");
}

// ============================================================================
// RequestDescriptor Tests
// ============================================================================

#[test]
fn test_descriptor_set_header_replaces_case_insensitive() {
    let mut request = RequestDescriptor::new(Method::GET, "https://api.example.com");
    request.set_header("x-page-token", "a");
    request.set_header("X-Page-Token", "b");

    assert_eq!(request.headers.len(), 1);
    assert_eq!(request.header("X-PAGE-TOKEN"), Some("b"));
}

#[test]
fn test_descriptor_with_url_keeps_shape() {
    let mut request = RequestDescriptor::new(Method::POST, "https://api.example.com/a");
    request.set_header("Accept", "application/json");
    request.body = Some("{}".to_string());

    let next = request.with_url("https://api.example.com/b");
    assert_eq!(next.url, "https://api.example.com/b");
    assert_eq!(next.method, Method::POST);
    assert_eq!(next.headers, request.headers);
    assert_eq!(next.body, request.body);
}

#[test]
fn test_descriptor_query_param() {
    let request = RequestDescriptor::new(Method::GET, "https://api.example.com/x?a=1&token=abc");
    assert_eq!(request.query_param("token"), Some("abc".to_string()));
    assert_eq!(request.query_param("missing"), None);
}

// ============================================================================
// Response Tests
// ============================================================================

#[test]
fn test_response_header_lookup() {
    let mut headers = HeaderMap::new();
    headers.append("link", HeaderValue::from_static("http://api/page2"));
    headers.append("link", HeaderValue::from_static("http://api/other"));
    let response = Response::new(200, headers, "");

    assert_eq!(response.header("LINK").unwrap(), Some("http://api/page2"));
    assert_eq!(response.header("x-missing").unwrap(), None);
}

#[test]
fn test_response_header_not_ascii() {
    let mut headers = HeaderMap::new();
    headers.insert("link", HeaderValue::from_bytes(b"http://api/\xff").unwrap());
    let response = Response::new(200, headers, "");

    assert!(matches!(
        response.header("link"),
        Err(Error::MalformedResponse { .. })
    ));
}

#[test]
fn test_response_json() {
    let response = Response::new(200, HeaderMap::new(), r#"{"next": null}"#);
    assert_eq!(response.json().unwrap(), serde_json::json!({"next": null}));
    assert!(response.is_success());

    let response = Response::new(500, HeaderMap::new(), "<html>oops</html>");
    assert!(matches!(
        response.json(),
        Err(Error::MalformedResponse { .. })
    ));
    assert_eq!(response.text(), "<html>oops</html>");
    assert!(!response.is_success());
}

// ============================================================================
// ReqwestTransport Tests
// ============================================================================

#[tokio::test]
async fn test_reqwest_transport_get() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "2"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", "<https://api.example.com/users?page=3>; rel=\"next\"")
                .set_body_json(serde_json::json!({"users": [{"id": 1}]})),
        )
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let mut request = RequestDescriptor::new(
        Method::GET,
        format!("{}/api/users?page=2", mock_server.uri()),
    );
    request.set_header("Authorization", "Bearer test-token");

    let response = transport.execute(&request).await.unwrap();

    assert_eq!(response.status, 200);
    assert!(response.header("link").unwrap().unwrap().contains("page=3"));
    assert_eq!(response.json().unwrap()["users"][0]["id"], 1);
}

#[tokio::test]
async fn test_reqwest_transport_post_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string(r#"{"cursor":"abc"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let mut request = RequestDescriptor::new(Method::POST, format!("{}/search", mock_server.uri()));
    request.body = Some(r#"{"cursor":"abc"}"#.to_string());

    let response = transport.execute(&request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "[]");
}

#[tokio::test]
async fn test_reqwest_transport_default_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(header("X-Api-Version", "2"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = TransportConfig::builder().header("X-Api-Version", "2").build();
    let transport = ReqwestTransport::with_config(config).unwrap();
    let request = RequestDescriptor::new(Method::GET, format!("{}/items", mock_server.uri()));

    let response = transport.execute(&request).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_reqwest_transport_returns_error_statuses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = RequestDescriptor::new(Method::GET, format!("{}/missing", mock_server.uri()));

    let response = transport.execute(&request).await.unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.text(), "not here");
}

#[tokio::test]
async fn test_reqwest_transport_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let config = TransportConfig::builder()
        .timeout(Duration::from_millis(100))
        .build();
    let transport = ReqwestTransport::with_config(config).unwrap();
    let request = RequestDescriptor::new(Method::GET, format!("{}/slow", mock_server.uri()));

    let err = transport.execute(&request).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 100 }));
    assert!(err.is_transport_failure());
}

#[tokio::test]
async fn test_reqwest_transport_connection_refused() {
    let transport = ReqwestTransport::new().unwrap();
    let request = RequestDescriptor::new(Method::GET, "http://127.0.0.1:1/unreachable");

    let err = transport.execute(&request).await.unwrap_err();
    assert!(err.is_transport_failure());
}
