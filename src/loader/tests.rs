//! Tests for config loader module

use super::*;
use crate::config::{HttpErrorAction, PaginationConfig, PaginationType, ParamLocation};
use crate::error::Error;
use crate::types::Method;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use test_case::test_case;

fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ============================================================================
// Basic Loading Tests
// ============================================================================

#[test]
fn test_load_minimal_config() {
    let yaml = r#"
url: https://api.example.com/items
"#;

    let config = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap();
    assert_eq!(config.url, "https://api.example.com/items");
    assert_eq!(config.method, Method::GET);
    assert_eq!(config.pagination, PaginationConfig::None);
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.wait_between_pages_ms, 0);
}

#[test]
fn test_load_full_config() {
    let yaml = r#"
url: https://api.example.com/{{ vars.version }}/search
method: POST
headers:
  Authorization: Bearer {{ vars.token }}
body: '{"query": "rust"}'
vars:
  version: v2
  token: secret
results_path: data.items
wait_between_pages_ms: 250
timeout_secs: 10
user_agent: ingest/1.0
http_errors:
  - status: "404|410"
    action: stop
  - status: "5.."
    action: fail
pagination:
  type: TOKEN_IN_RESPONSE_BODY
  token_path: meta.next_cursor
  param: cursor
  location: body
"#;

    let config = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap();
    assert_eq!(config.method, Method::POST);
    assert_eq!(config.headers.get("Authorization").unwrap(), "Bearer {{ vars.token }}");
    assert_eq!(config.vars.len(), 2);
    assert_eq!(config.results_path.as_deref(), Some("data.items"));
    assert_eq!(config.wait_between_pages_ms, 250);
    assert_eq!(config.timeout_secs, 10);
    assert_eq!(config.user_agent.as_deref(), Some("ingest/1.0"));
    assert_eq!(config.http_errors.len(), 2);
    assert_eq!(config.http_errors[0].action, HttpErrorAction::Stop);
    assert_eq!(
        config.pagination,
        PaginationConfig::token_in_body("meta.next_cursor", "cursor", ParamLocation::Body)
    );
}

// ============================================================================
// Pagination Type Tests
// ============================================================================

#[test_case("{type: NONE}", PaginationType::None)]
#[test_case("{type: LINK_IN_RESPONSE_HEADER}", PaginationType::LinkInResponseHeader)]
#[test_case("{type: LINK_IN_RESPONSE_BODY, next_page_path: links.next}", PaginationType::LinkInResponseBody)]
#[test_case("{type: TOKEN_IN_RESPONSE_BODY, token_path: next, param: token}", PaginationType::TokenInResponseBody)]
#[test_case("{type: INCREMENT_AN_INDEX, param: page}", PaginationType::IncrementAnIndex)]
#[test_case("{type: CUSTOM, expression: body.next}", PaginationType::Custom)]
fn test_load_pagination_types(pagination: &str, expected: PaginationType) {
    let yaml = format!("url: https://api.example.com/items\npagination: {pagination}\n");

    let config = load_config_from_str(&yaml, ConfigFormat::Yaml).unwrap();
    assert_eq!(config.pagination_type(), expected);
}

#[test]
fn test_load_link_header_defaults() {
    let yaml = r#"
url: https://api.github.com/repos/rust-lang/rust/issues
pagination:
  type: LINK_IN_RESPONSE_HEADER
"#;

    let config = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap();
    assert_eq!(config.pagination, PaginationConfig::link_in_header("Link"));
}

#[test]
fn test_load_index_defaults() {
    let yaml = r#"
url: https://api.example.com/items
pagination:
  type: INCREMENT_AN_INDEX
  param: offset
  step: 100
  max: 1000
"#;

    let config = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap();
    assert_eq!(
        config.pagination,
        PaginationConfig::IncrementAnIndex {
            param: "offset".to_string(),
            location: ParamLocation::Query,
            start: 0,
            step: 100,
            max: Some(1000),
            stop_on_empty_page: true,
        }
    );
}

#[test]
fn test_load_json_config() {
    let json = r#"{
        "url": "https://api.example.com/items",
        "pagination": {"type": "CUSTOM", "expression": "body.links.next"}
    }"#;

    let config = load_config_from_str(json, ConfigFormat::Json).unwrap();
    assert_eq!(config.pagination, PaginationConfig::custom("body.links.next"));
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_unknown_pagination_type() {
    let yaml = r#"
url: https://api.example.com/items
pagination:
  type: CURSOR
"#;

    let err = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
}

#[test]
fn test_missing_required_param() {
    let yaml = r#"
url: https://api.example.com/items
pagination:
  type: LINK_IN_RESPONSE_BODY
"#;

    let err = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap_err();
    assert!(err.to_string().contains("next_page_path"));
}

#[test]
fn test_validation_reports_every_problem() {
    let yaml = r#"
url: api.example.com/items
timeout_secs: 0
pagination:
  type: INCREMENT_AN_INDEX
  param: page
  step: 0
"#;

    let err = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("url must start with"));
    assert!(message.contains("timeout_secs"));
    assert!(message.contains("pagination.step"));
}

#[test]
fn test_invalid_yaml() {
    let err = load_config_from_str("url: [unclosed", ConfigFormat::Yaml).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
}

// ============================================================================
// File Loading Tests
// ============================================================================

#[test]
fn test_load_config_from_yaml_file() {
    let file = write_temp(
        ".yaml",
        "url: https://api.example.com/items\npagination:\n  type: LINK_IN_RESPONSE_BODY\n  next_page_path: next\n",
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.pagination, PaginationConfig::link_in_body("next"));
}

#[test]
fn test_load_config_from_json_file() {
    let file = write_temp(".json", r#"{"url": "https://api.example.com/items"}"#);

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.pagination_type(), PaginationType::None);
}

#[test]
fn test_load_config_missing_file() {
    let err = load_config("/nonexistent/source.yaml").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test_case("source.yaml", ConfigFormat::Yaml)]
#[test_case("source.YML", ConfigFormat::Yaml)]
#[test_case("dir/source.json", ConfigFormat::Json)]
fn test_config_format_from_path(path: &str, expected: ConfigFormat) {
    assert_eq!(ConfigFormat::from_path(Path::new(path)).unwrap(), expected);
}

#[test]
fn test_config_format_unknown_extension() {
    let file = write_temp(".toml", "url = 'https://api.example.com'");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
}
