//! Tool dispatch.
//!
//! Every operation a client can invoke is one [`ToolCall`] variant, decoded
//! from `{"name": ..., "arguments": {...}}` and dispatched by an exhaustive
//! match in [`Assistant::try_execute`].

pub mod schema;

pub use schema::{find_tool, tool_specs, validate_arguments, ToolSpec};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::bridge::Bridge;
use crate::config::AnalysisConfig;
use crate::core::diagnostics::{detect_and_explain, detect_errors, explain_error};
use crate::core::graph::{get_all_formulas, get_cell_dependents, get_cell_precedents};
use crate::core::reader::{CellReader, CellWriter};
use crate::core::stats::{column_statistics, detect_duplicates, detect_outliers};
use crate::core::structure::analyze_structure;
use crate::error::{SheetError, SheetResult};
use crate::types::Literal;

/// One supported operation with its arguments. `sheet: None` targets the
/// active sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    ReadCell {
        #[serde(default)]
        sheet: Option<String>,
        address: String,
    },
    ReadRange {
        #[serde(default)]
        sheet: Option<String>,
        range: String,
    },
    WriteCell {
        #[serde(default)]
        sheet: Option<String>,
        address: String,
        value: String,
    },
    GetAllFormulas {
        #[serde(default)]
        sheet: Option<String>,
    },
    GetCellPrecedents {
        #[serde(default)]
        sheet: Option<String>,
        address: String,
    },
    GetCellDependents {
        #[serde(default)]
        sheet: Option<String>,
        address: String,
    },
    AnalyzeStructure {
        #[serde(default)]
        sheet: Option<String>,
    },
    DetectErrors {
        #[serde(default)]
        sheet: Option<String>,
        #[serde(default)]
        range: Option<String>,
    },
    ExplainError {
        #[serde(default)]
        sheet: Option<String>,
        address: String,
    },
    DetectAndExplain {
        #[serde(default)]
        sheet: Option<String>,
        #[serde(default)]
        range: Option<String>,
    },
    ColumnStatistics {
        #[serde(default)]
        sheet: Option<String>,
        column: String,
    },
    DetectOutliers {
        #[serde(default)]
        sheet: Option<String>,
        range: String,
        #[serde(default)]
        z_threshold: Option<f64>,
    },
    DetectDuplicates {
        #[serde(default)]
        sheet: Option<String>,
        range: String,
    },
    SnapshotRange {
        #[serde(default)]
        sheet: Option<String>,
        range: String,
        #[serde(default)]
        max_cells: Option<usize>,
    },
    ListSheets {},
}

impl ToolCall {
    /// Decode a call from a tool name and its argument object.
    pub fn from_parts(name: &str, arguments: Value) -> SheetResult<Self> {
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };
        serde_json::from_value(json!({ "name": name, "arguments": arguments }))
            .map_err(|e| SheetError::InvalidArguments(format!("{}: {}", name, e)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ReadCell { .. } => "read_cell",
            ToolCall::ReadRange { .. } => "read_range",
            ToolCall::WriteCell { .. } => "write_cell",
            ToolCall::GetAllFormulas { .. } => "get_all_formulas",
            ToolCall::GetCellPrecedents { .. } => "get_cell_precedents",
            ToolCall::GetCellDependents { .. } => "get_cell_dependents",
            ToolCall::AnalyzeStructure { .. } => "analyze_structure",
            ToolCall::DetectErrors { .. } => "detect_errors",
            ToolCall::ExplainError { .. } => "explain_error",
            ToolCall::DetectAndExplain { .. } => "detect_and_explain",
            ToolCall::ColumnStatistics { .. } => "column_statistics",
            ToolCall::DetectOutliers { .. } => "detect_outliers",
            ToolCall::DetectDuplicates { .. } => "detect_duplicates",
            ToolCall::SnapshotRange { .. } => "snapshot_range",
            ToolCall::ListSheets {} => "list_sheets",
        }
    }

    /// Whether the call changes the document.
    pub fn is_mutating(&self) -> bool {
        matches!(self, ToolCall::WriteCell { .. })
    }
}

/// Owns a document and the analysis settings, and runs tool calls against it.
pub struct Assistant<B: Bridge> {
    document: B,
    config: AnalysisConfig,
}

impl<B: Bridge> Assistant<B> {
    pub fn new(document: B, config: AnalysisConfig) -> Self {
        Self { document, config }
    }

    pub fn document(&self) -> &B {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut B {
        &mut self.document
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn into_document(self) -> B {
        self.document
    }

    /// Run a call. Failures come back as `{"error": message}`.
    pub fn execute(&mut self, call: ToolCall) -> Value {
        let name = call.name();
        match self.try_execute(call) {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                json!({ "error": e.to_string() })
            }
        }
    }

    /// Decode and run a call given as name plus arguments.
    pub fn execute_named(&mut self, name: &str, arguments: Value) -> Value {
        match ToolCall::from_parts(name, arguments) {
            Ok(call) => self.execute(call),
            Err(e) => json!({ "error": e.to_string() }),
        }
    }

    pub fn try_execute(&mut self, call: ToolCall) -> SheetResult<Value> {
        info!(tool = call.name(), "tool call");

        let reader = CellReader::new(&self.document, &self.config);
        let value = match call {
            ToolCall::ReadCell { sheet, address } => {
                serde_json::to_value(reader.read_cell(sheet.as_deref(), &address)?)?
            }
            ToolCall::ReadRange { sheet, range } => {
                let grid = reader.read_range(sheet.as_deref(), &range)?;
                json!({ "range": range, "cells": grid })
            }
            ToolCall::GetAllFormulas { sheet } => {
                let sheet = reader.resolve_sheet(sheet.as_deref())?;
                let formulas = get_all_formulas(&reader, &sheet)?;
                json!({ "sheet": sheet, "count": formulas.len(), "formulas": formulas })
            }
            ToolCall::GetCellPrecedents { sheet, address } => {
                let precedents = get_cell_precedents(&reader, sheet.as_deref(), &address)?;
                json!({ "address": address, "precedents": precedents })
            }
            ToolCall::GetCellDependents { sheet, address } => {
                let dependents = get_cell_dependents(&reader, sheet.as_deref(), &address)?;
                json!({ "address": address, "dependents": dependents })
            }
            ToolCall::AnalyzeStructure { sheet } => {
                serde_json::to_value(analyze_structure(&reader, sheet.as_deref())?)?
            }
            ToolCall::DetectErrors { sheet, range } => {
                let errors = detect_errors(&reader, sheet.as_deref(), range.as_deref())?;
                json!({ "count": errors.len(), "errors": errors })
            }
            ToolCall::ExplainError { sheet, address } => {
                serde_json::to_value(explain_error(&reader, sheet.as_deref(), &address)?)?
            }
            ToolCall::DetectAndExplain { sheet, range } => {
                let errors = detect_and_explain(&reader, sheet.as_deref(), range.as_deref())?;
                json!({ "count": errors.len(), "errors": errors })
            }
            ToolCall::ColumnStatistics { sheet, column } => {
                serde_json::to_value(column_statistics(&reader, sheet.as_deref(), &column)?)?
            }
            ToolCall::DetectOutliers {
                sheet,
                range,
                z_threshold,
            } => serde_json::to_value(detect_outliers(
                &reader,
                sheet.as_deref(),
                &range,
                z_threshold,
            )?)?,
            ToolCall::DetectDuplicates { sheet, range } => {
                let duplicates = detect_duplicates(&reader, sheet.as_deref(), &range)?;
                json!({ "range": range, "duplicates": duplicates })
            }
            ToolCall::SnapshotRange {
                sheet,
                range,
                max_cells,
            } => {
                let limit = max_cells.unwrap_or(self.config.max_cells);
                serde_json::to_value(reader.snapshot_range(sheet.as_deref(), &range, limit)?)?
            }
            ToolCall::ListSheets {} => json!({
                "sheets": reader.sheet_names()?,
                "active": self.document.active_sheet()?
            }),
            ToolCall::WriteCell {
                sheet,
                address,
                value,
            } => {
                let mut writer = CellWriter::new(&mut self.document, &self.config);
                let literal = writer.write_cell(sheet.as_deref(), &address, &value)?;
                let (kind, written) = match literal {
                    Literal::Numeric(n) => ("numeric", json!(n)),
                    Literal::Text(t) => ("text", json!(t)),
                    Literal::Formula(f) => ("formula", json!(f)),
                };
                json!({
                    "address": address.trim().to_ascii_uppercase(),
                    "written": written,
                    "type": kind
                })
            }
        };
        Ok(value)
    }
}
