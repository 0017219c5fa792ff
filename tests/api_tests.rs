//! API integration tests
//!
//! Requests go through the full router (CORS and tracing layers included)
//! without binding a socket.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use md2office::api::handlers::{ApiResponse, EndpointInfo};
use md2office::api::{router, ApiConfig, AppState};
use md2office::config::ConvertConfig;
use md2office::types::DateFormat;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(AppState::new(ConvertConfig::default()).unwrap()))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIG AND STATE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_config_default() {
    let config = ApiConfig::default();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
}

#[test]
fn test_app_state_uses_config() {
    let config = ConvertConfig {
        date_format: Some(DateFormat::MmDdYyyy),
        ..Default::default()
    };
    let state = AppState::new(config).unwrap();
    assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(
        state.converter.config().date_format,
        Some(DateFormat::MmDdYyyy)
    );
}

#[test]
fn test_api_response_err() {
    let response: ApiResponse<String> = ApiResponse::err("boom");
    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.error.as_deref(), Some("boom"));
}

#[test]
fn test_endpoint_info_serializes() {
    let info = EndpointInfo {
        path: "/health".to_string(),
        method: "GET".to_string(),
        description: "Health check".to_string(),
    };
    let value = serde_json::to_value(&info).unwrap();
    assert_eq!(value["method"], "GET");
}

// ═══════════════════════════════════════════════════════════════════════════
// INFO ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (status, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "md2office API Server");

    let paths: Vec<&str> = body["data"]["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["path"].as_str())
        .collect();
    assert!(paths.contains(&"/api/v1/extract"));
    assert!(paths.contains(&"/api/v1/classify"));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert!(body["request_id"].as_str().is_some());
}

#[tokio::test]
async fn test_version() {
    let (status, body) = get("/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(
        body["data"]["features"],
        json!(["extract", "validate", "classify"])
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _) = get("/api/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════════
// EXTRACT
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_extract_endpoint() {
    let content = "---\ntitle: Budget\nauthor: Finance\n---\n| a | b |\n|---|---|\n| 1 | {=A2*2} |\n";
    let (status, body) = post("/api/v1/extract", json!({ "content": content })).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["table_count"], 1);
    assert_eq!(data["formulas"][0]["formula"], "A2*2");
    assert_eq!(data["formulas"][0]["placeholder"], "__FORMULA_0_1_1__");
    assert_eq!(
        data["processed_content"],
        "| a | b |\n|---|---|\n| 1 | __FORMULA_0_1_1__ |\n"
    );
    assert_eq!(data["metadata"]["title"], "Budget");
    assert_eq!(data["warnings"], json!([]));
}

#[tokio::test]
async fn test_extract_bad_front_matter_is_422() {
    let (status, body) = post(
        "/api/v1/extract",
        json!({ "content": "---\ntitle: [x\n---\nbody\n" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Metadata parsing error"));
}

#[tokio::test]
async fn test_extract_rejects_malformed_json() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/extract")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

// ═══════════════════════════════════════════════════════════════════════════
// VALIDATE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_validate_endpoint() {
    let (status, body) = post(
        "/api/v1/validate",
        json!({ "formula": "=SUM(A1:A3)+MYFUNC(B1)" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["formula"], "SUM(A1:A3)+MYFUNC(B1)");
    assert_eq!(data["is_valid"], true);
    assert_eq!(data["warnings"], json!(["Unknown function: MYFUNC"]));
    assert_eq!(data["functions"], json!(["SUM", "MYFUNC"]));
}

#[tokio::test]
async fn test_validate_endpoint_reports_errors() {
    let (_, body) = post("/api/v1/validate", json!({ "formula": "SUM(A1" })).await;
    assert_eq!(body["data"]["is_valid"], false);
    assert_eq!(body["data"]["errors"], json!(["Mismatched parentheses"]));
}

// ═══════════════════════════════════════════════════════════════════════════
// CLASSIFY
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_classify_endpoint() {
    let (status, body) = post(
        "/api/v1/classify",
        json!({ "values": ["42", "TRUE", "2025-01-28", "{=A1}", "text"], "date_format": "YYYY-MM-DD" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["date_format"], "YYYY-MM-DD");
    let types: Vec<&str> = body["data"]["cells"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["data_type"].as_str())
        .collect();
    assert_eq!(types, vec!["number", "boolean", "date", "formula", "string"]);
    assert_eq!(body["data"]["cells"][0]["numeric_value"], 42.0);
    assert_eq!(body["data"]["cells"][2]["date_value"], "2025-01-28");
}

#[tokio::test]
async fn test_classify_default_date_format() {
    let (_, body) = post("/api/v1/classify", json!({ "values": ["28/01/2025"] })).await;
    assert_eq!(body["data"]["date_format"], "DD/MM/YYYY");
    assert_eq!(body["data"]["cells"][0]["data_type"], "date");
}

#[tokio::test]
async fn test_classify_bad_date_format_is_400() {
    let (status, body) = post(
        "/api/v1/classify",
        json!({ "values": ["1"], "date_format": "DD.MM.YYYY" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("unknown date format"));
}
