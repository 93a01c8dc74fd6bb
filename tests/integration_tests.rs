//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML config → OAuth2 token → paginated
//! product fetch → CSV upload

use catalog_harvest::auth::TokenStore;
use catalog_harvest::{AppConfig, Catalog, ErrorCategory, HttpClient};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::path::Path;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILTER: &str =
    "Labels/Any (c: c/Name eq 'Foreign Accounts') and TotalAvailableQuantity gt 0 and ProfileID eq 32001166";

fn config_for(server: &MockServer, token_cache: &Path, slots: usize) -> AppConfig {
    let yaml = format!(
        r#"
api:
  base_url: "{uri}"
  timeout_seconds: 5
auth:
  token_url: "{uri}/oauth2/token"
  client_id: "client"
  client_secret: "secret"
  refresh_token: "refresh-1"
  token_cache: "{cache}"
pagination:
  slots: {slots}
  max_calls: 6000
  window_seconds: 1
"#,
        uri = server.uri(),
        cache = token_cache.display(),
    );
    AppConfig::from_yaml_str(&yaml).unwrap()
}

fn catalog_from(config: &AppConfig) -> Catalog {
    config.validate().unwrap();
    let client = HttpClient::with_auth(config.http_config(), config.auth_config()).unwrap();
    Catalog::new(
        client,
        config.catalog_paths(),
        config.page_template(),
        config.paginator_config(),
    )
    .unwrap()
}

fn products(first_id: i64, count: i64) -> Vec<Value> {
    (first_id..first_id + count)
        .map(|id| {
            json!({
                "ID": id,
                "ProfileID": 32001166,
                "Sku": format!("SKU-{id}"),
                "Title": format!("Product {id}"),
                "Labels": [{"Name": "Foreign Accounts"}],
                "Attributes": [{"Name": "Color", "Value": "Blue"}]
            })
        })
        .collect()
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Serve `pages` at `$skip` = 0, 100, 200, ...; any other offset is an empty
/// terminal page
async fn mount_pages(server: &MockServer, pages: &[Vec<Value>]) {
    for (index, records) in pages.iter().enumerate() {
        let skip = index * 100;
        let mut body = json!({
            "@odata.context": format!("{}/v1/$metadata#Products", server.uri()),
            "value": records,
        });
        if index + 1 < pages.len() {
            body["@odata.nextLink"] =
                json!(format!("{}/v1/Products?$skip={}", server.uri(), skip + 100));
        }

        Mock::given(method("GET"))
            .and(path("/v1/Products"))
            .and(query_param("$skip", skip.to_string()))
            .and(header("Authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/v1/Products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .with_priority(10)
        .mount(server)
        .await;
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_all_pages_with_oauth2() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("tokens.json");

    mount_token(&mock_server, 1).await;
    mount_pages(
        &mock_server,
        &[products(1, 100), products(101, 100), products(201, 37)],
    )
    .await;

    let catalog = catalog_from(&config_for(&mock_server, &cache, 2));
    let result = catalog.products(None).await.unwrap();

    assert_eq!(result.len(), 237);
    assert!(result.stats.pages_fetched >= 3);

    let mut ids: Vec<i64> = result.records.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=237).collect::<Vec<_>>());

    // the refreshed token was persisted
    let stored = TokenStore::new(&cache).load().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-1");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_fetch_sends_filter_with_start_date() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_token(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/Products"))
        .and(query_param(
            "$filter",
            format!("{FILTER} and IsParent eq true and CreateDateUtc ge 2024-02-29"),
        ))
        .and(query_param("$expand", "Attributes,Labels,Images"))
        .and(query_param("$skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": products(1, 3)
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut catalog = catalog_from(&config_for(&mock_server, &dir.path().join("t.json"), 1));
    catalog.set_parent_only(true);

    let since = NaiveDate::from_ymd_opt(2024, 2, 29);
    let result = catalog.products(since).await.unwrap();
    assert_eq!(result.len(), 3);
}

#[tokio::test]
async fn test_fetch_transport_error_fails_run() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_token(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/Products"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let catalog = catalog_from(&config_for(&mock_server, &dir.path().join("t.json"), 3));
    let err = catalog.products(None).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Transport);
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_fetch_rejected_token_is_auth_error() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/Products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let catalog = catalog_from(&config_for(&mock_server, &dir.path().join("t.json"), 2));
    let err = catalog.products(None).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Auth);
}

#[tokio::test]
async fn test_fetch_malformed_page_is_decode_error() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_token(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/Products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let catalog = catalog_from(&config_for(&mock_server, &dir.path().join("t.json"), 1));
    let err = catalog.products(None).await.unwrap_err();

    assert!(err.is_decode());
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_then_upload_csv() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_token(&mock_server, 1).await;
    mount_pages(&mock_server, &[products(1, 2), products(3, 1)]).await;

    Mock::given(method("POST"))
        .and(path("/v1/ProductUpload"))
        .and(query_param("profileid", "12345"))
        .and(header("Content-Type", "text/csv"))
        .and(header("Authorization", "Bearer access-1"))
        .and(body_string_contains(
            "Auction Title,Inventory Number,Item Create Date,UPC,Brand,Condition,Seller Cost,Buy It Now Price,Picture URLs,Relationship Name,Labels,Classification,Attribute1Name,Attribute1Value",
        ))
        .and(body_string_contains("Product 3,SKU-3,"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let catalog = catalog_from(&config_for(&mock_server, &dir.path().join("t.json"), 2));
    let result = catalog.products(None).await.unwrap();
    assert_eq!(result.len(), 3);

    catalog.upload(&result.records, 12345).await.unwrap();
}

#[tokio::test]
async fn test_upload_without_region_fails() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let catalog = catalog_from(&config_for(&mock_server, &dir.path().join("t.json"), 1));
    let err = catalog.upload(&[], 0).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Config);
}
