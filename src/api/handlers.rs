//! API request handlers
//!
//! Handlers for all REST API endpoints. Document content is posted inline;
//! the server never reads or writes files.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::CellClassifier;
use crate::types::{DateFormat, DocumentMetadata, FormulaLocation, ProcessedCell};

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(method: &str, path: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "md2office API Server".to_string(),
        version: state.version.clone(),
        description: "Formula extraction and cell classification for markdown documents"
            .to_string(),
        endpoints: vec![
            EndpointInfo::new("GET", "/health", "Health check endpoint"),
            EndpointInfo::new("GET", "/version", "Get server version"),
            EndpointInfo::new(
                "POST",
                "/api/v1/extract",
                "Extract table formulas from a markdown document",
            ),
            EndpointInfo::new("POST", "/api/v1/validate", "Check formula syntax"),
            EndpointInfo::new("POST", "/api/v1/classify", "Classify cell values"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "extract".to_string(),
            "validate".to_string(),
            "classify".to_string(),
        ],
    }))
}

/// Extract request
#[derive(Deserialize)]
pub struct ExtractRequest {
    pub content: String,
}

/// Extract response
#[derive(Serialize)]
pub struct ExtractResponse {
    pub metadata: DocumentMetadata,
    pub date_format: DateFormat,
    pub processed_content: String,
    pub formulas: Vec<FormulaLocation>,
    pub table_count: usize,
    pub warnings: Vec<String>,
}

/// POST /api/v1/extract - Normalize metadata and extract formulas
pub async fn extract(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> impl IntoResponse {
    match state.converter.prepare(&req.content) {
        Ok(doc) => (
            StatusCode::OK,
            Json(ApiResponse::ok(ExtractResponse {
                metadata: doc.metadata,
                date_format: doc.date_format,
                processed_content: doc.extraction.processed_content,
                formulas: doc.extraction.formulas,
                table_count: doc.extraction.table_count,
                warnings: doc.warnings,
            })),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::err(e.to_string())),
        ),
    }
}

/// Validate request
#[derive(Deserialize)]
pub struct ValidateRequest {
    pub formula: String,
}

/// Validate response
#[derive(Serialize)]
pub struct ValidateResponse {
    pub formula: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub functions: Vec<String>,
}

/// POST /api/v1/validate - Syntax-check one formula
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> impl IntoResponse {
    let formula = req.formula.trim_start_matches('=').to_string();
    let result = state.validator.validate(&formula);
    let functions = state.validator.function_names(&formula);

    Json(ApiResponse::ok(ValidateResponse {
        formula,
        is_valid: result.is_valid,
        errors: result.errors,
        warnings: result.warnings,
        functions,
    }))
}

/// Classify request
#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub values: Vec<String>,
    #[serde(default)]
    pub date_format: Option<String>,
}

/// Classify response
#[derive(Serialize)]
pub struct ClassifyResponse {
    pub date_format: DateFormat,
    pub cells: Vec<ProcessedCell>,
}

/// POST /api/v1/classify - Decide the data type of cell values
pub async fn classify(Json(req): Json<ClassifyRequest>) -> impl IntoResponse {
    let date_format = match req.date_format.as_deref().map(str::parse::<DateFormat>) {
        None => DateFormat::default(),
        Some(Ok(format)) => format,
        Some(Err(e)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<ClassifyResponse>::err(e)),
            );
        }
    };

    let classifier = match CellClassifier::new(date_format) {
        Ok(classifier) => classifier,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<ClassifyResponse>::err(e.to_string())),
            );
        }
    };

    let cells = req.values.iter().map(|v| classifier.classify(v)).collect();
    (
        StatusCode::OK,
        Json(ApiResponse::ok(ClassifyResponse { date_format, cells })),
    )
}
