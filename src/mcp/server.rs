//! Cellsense MCP Server implementation
//!
//! Implements the Model Context Protocol over stdin/stdout using JSON-RPC.
//! stdout carries protocol messages only; logs go to stderr.

use std::io::{BufRead, BufReader, Write};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::bridge::Workbook;
use crate::config::AnalysisConfig;
use crate::tools::{tool_specs, validate_arguments, Assistant, ToolCall};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }
}

/// Serves one workbook to an MCP client. Edits made through `write_cell` stay
/// in memory for the lifetime of the process.
pub struct CellsenseMcpServer {
    assistant: Assistant<Workbook>,
}

impl CellsenseMcpServer {
    pub fn new(workbook: Workbook, config: AnalysisConfig) -> Self {
        Self {
            assistant: Assistant::new(workbook, config),
        }
    }

    /// Handle a JSON-RPC request; notifications get no response.
    pub fn handle_request(&mut self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone().unwrap_or(Value::Null);
        debug!(method = %request.method, "request");

        match request.method.as_str() {
            "initialize" => Some(JsonRpcResponse::result(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": {
                            "listChanged": false
                        }
                    },
                    "serverInfo": {
                        "name": "cellsense-mcp",
                        "version": env!("CARGO_PKG_VERSION")
                    },
                    "instructions": "Cellsense MCP Server - spreadsheet formula analysis. Read cells and ranges, trace precedents and dependents, classify inputs and outputs, find and explain calculation errors, and profile numeric columns."
                }),
            )),
            "notifications/initialized" => None,
            "tools/list" => Some(JsonRpcResponse::result(
                id,
                json!({ "tools": tool_specs() }),
            )),
            "tools/call" => {
                let tool_name = request
                    .params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or(json!({}));

                Some(JsonRpcResponse::result(
                    id,
                    self.call_tool(tool_name, arguments),
                ))
            }
            "ping" => Some(JsonRpcResponse::result(id, json!({}))),
            _ => Some(JsonRpcResponse::error(
                id,
                -32601,
                format!("Method not found: {}", request.method),
            )),
        }
    }

    /// Validate, decode and run one tool call, wrapped as MCP content.
    pub fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let outcome = validate_arguments(name, &arguments)
            .and_then(|_| ToolCall::from_parts(name, arguments))
            .map(|call| self.assistant.execute(call));

        let payload = match outcome {
            Ok(value) => value,
            Err(e) => json!({ "error": e.to_string() }),
        };
        let is_error = payload.get("error").map(Value::is_string).unwrap_or(false);

        json!({
            "content": [{
                "type": "text",
                "text": serde_json::to_string_pretty(&payload).unwrap_or_default()
            }],
            "structuredContent": payload,
            "isError": is_error
        })
    }

    /// Run synchronously over stdin/stdout until EOF.
    ///
    /// # Coverage Exclusion
    /// Reads from stdin forever. Request handling is tested via `handle_request()`.
    #[cfg(not(coverage))]
    pub fn run_stdio(&mut self) {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());
        info!("Cellsense MCP server ready on stdio");

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };

            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(&request),
                Err(e) => Some(JsonRpcResponse::error(
                    Value::Null,
                    -32700,
                    format!("Parse error: {}", e),
                )),
            };

            if let Some(resp) = response {
                if let Ok(text) = serde_json::to_string(&resp) {
                    let _ = writeln!(stdout, "{}", text);
                    let _ = stdout.flush();
                }
            }
        }
        info!("stdin closed, MCP server exiting");
    }

    /// Stub for coverage builds
    #[cfg(coverage)]
    pub fn run_stdio(&mut self) {}
}

/// Serve `workbook` over stdin/stdout until EOF.
pub fn run_mcp_server_sync(workbook: Workbook, config: AnalysisConfig) {
    CellsenseMcpServer::new(workbook, config).run_stdio();
}
