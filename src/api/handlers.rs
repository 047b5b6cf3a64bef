//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::server::AppState;
use crate::tools::{tool_specs, validate_arguments, ToolCall, ToolSpec};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
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
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub workbook: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(RootResponse {
        name: "Cellsense API Server".to_string(),
        version: state.version.clone(),
        workbook: state.source.clone(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("GET", "/api/v1/tools", "List tools with their input schemas"),
            endpoint("POST", "/api/v1/tools/call", "Run one tool against the workbook"),
        ],
    }))
}

/// Health check response
#[derive(Debug, Serialize)]
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
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub tools: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        tools: tool_specs().iter().map(|t| t.name.to_string()).collect(),
    }))
}

/// GET /api/v1/tools - Tool definitions
pub async fn list_tools() -> impl IntoResponse {
    Json(ApiResponse::<Vec<ToolSpec>>::ok(tool_specs()))
}

/// Tool call request
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// POST /api/v1/tools/call - Run a tool
///
/// Malformed arguments are a 400. A tool that runs but fails (bad address,
/// range too large, unknown sheet) is a 200 with `success: false`.
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToolCallRequest>,
) -> impl IntoResponse {
    let arguments = if req.arguments.is_null() {
        Value::Object(Default::default())
    } else {
        req.arguments
    };

    let call = match validate_arguments(&req.name, &arguments)
        .and_then(|_| ToolCall::from_parts(&req.name, arguments))
    {
        Ok(call) => call,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Value>::err(e.to_string())),
            )
        }
    };

    if call.is_mutating() {
        info!(tool = call.name(), workbook = %state.source, "document edit");
    }

    let result = state.assistant.lock().await.execute(call);
    let response = match result.get("error").and_then(Value::as_str) {
        Some(message) => ApiResponse::err(message),
        None => ApiResponse::ok(result),
    };
    (StatusCode::OK, Json(response))
}
