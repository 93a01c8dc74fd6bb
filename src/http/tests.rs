//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use crate::error::Error;
use pretty_assertions::assert_eq;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::with_config(HttpClientConfig::builder().base_url(server.uri()).build()).unwrap()
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.base_url, None);
    assert!(config.default_headers.is_empty());
    assert!(config.user_agent.starts_with("catalog-harvest/"));
}

#[test]
fn test_config_builder_keeps_header_order() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(5))
        .header("X-One", "1")
        .header("X-Two", "2")
        .user_agent("harvest-test/0.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.user_agent, "harvest-test/0.0");
    assert_eq!(
        config.default_headers,
        vec![
            ("X-One".to_string(), "1".to_string()),
            ("X-Two".to_string(), "2".to_string()),
        ]
    );
}

#[test_case("v1/Products", "https://api.example.com/v1/Products" ; "relative")]
#[test_case("/v1/Products", "https://api.example.com/v1/Products" ; "leading slash")]
#[test_case("https://other.example.com/v1/Products?$skip=100", "https://other.example.com/v1/Products?$skip=100" ; "absolute https")]
#[test_case("http://localhost:9/x", "http://localhost:9/x" ; "absolute http")]
fn test_resolve_against_base(target: &str, expected: &str) {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com/")
        .build();
    assert_eq!(config.resolve(target), expected);
}

#[test]
fn test_resolve_without_base_is_identity() {
    assert_eq!(HttpClientConfig::default().resolve("/v1/Products"), "/v1/Products");
}

#[test]
fn test_request_config_collects_options() {
    let options = RequestConfig::new()
        .query("$skip", "100")
        .query("$expand", "Labels")
        .header("X-Request-Id", "r-1")
        .payload("text/csv", b"a,b\n".to_vec())
        .timeout(Duration::from_secs(2));

    assert_eq!(options.query[0], ("$skip".to_string(), "100".to_string()));
    assert_eq!(options.query[1].0, "$expand");
    assert_eq!(options.headers.len(), 1);
    assert_eq!(
        options.payload,
        Some(Payload {
            content_type: "text/csv".to_string(),
            bytes: bytes::Bytes::from_static(b"a,b\n"),
        })
    );
    assert_eq!(options.timeout, Some(Duration::from_secs(2)));
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_get_text_sends_query_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/Products"))
        .and(query_param("$filter", "ProfileID eq 1"))
        .and(query_param("$skip", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestConfig::new()
        .query("$filter", "ProfileID eq 1")
        .query("$skip", "200");
    let text = client_for(&server)
        .get_text("/v1/Products", options)
        .await
        .unwrap();

    assert_eq!(text, r#"{"value":[]}"#);
}

#[tokio::test]
async fn test_default_headers_precede_request_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("X-Client", "harvest"))
        .and(header("X-Request", "one"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .header("X-Client", "harvest")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let response = client
        .get("/ping", RequestConfig::new().header("X-Request", "one"))
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_bearer_credentials_attached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/Products"))
        .and(header("Authorization", "Bearer static-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::with_auth(
        HttpClientConfig::builder().base_url(server.uri()).build(),
        AuthConfig::Bearer {
            token: "static-token".to_string(),
        },
    )
    .unwrap();

    assert!(client.is_authenticated());
    client
        .get("/v1/Products", RequestConfig::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_post_payload_sets_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/ProductUpload"))
        .and(header("Content-Type", "text/csv"))
        .and(body_string("Auction Title\nWidget\n"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .post(
            "/v1/ProductUpload",
            RequestConfig::new().payload("text/csv", "Auction Title\nWidget\n"),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
}

#[tokio::test]
async fn test_absolute_target_ignores_base_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .base_url("https://unused.invalid")
            .build(),
    )
    .unwrap();

    client
        .get(&format!("{}/next", server.uri()), RequestConfig::new())
        .await
        .unwrap();
}

// ============================================================================
// Failures
// ============================================================================

#[test_case(400 ; "bad request")]
#[test_case(404 ; "not found")]
#[test_case(503 ; "unavailable")]
#[tokio::test]
async fn test_error_status_is_sent_once_and_keeps_body(status: u16) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/Products"))
        .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get("/v1/Products", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    match err {
        Error::HttpStatus { status: got, body } => {
            assert_eq!(got, status);
            assert_eq!(body, "nope");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_request_timeout_override() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get(
            "/slow",
            RequestConfig::new().timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 50 }));
}

#[test]
fn test_debug_hides_credentials() {
    let client = HttpClient::with_auth(
        HttpClientConfig::default(),
        AuthConfig::Bearer {
            token: "secret-token".to_string(),
        },
    )
    .unwrap();

    let debug = format!("{client:?}");
    assert!(debug.contains("authenticated: true"));
    assert!(!debug.contains("secret-token"));
}
