//! Tool definitions published to clients, with JSON Schema argument checks.

use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{SheetError, SheetResult};

/// A tool as advertised over MCP and the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn sheet_property() -> Value {
    json!({
        "type": "string",
        "description": "Sheet name (default: the active sheet)"
    })
}

fn object(properties: Value, required: &[&str]) -> Value {
    let mut properties = properties;
    if let Some(map) = properties.as_object_mut() {
        map.insert("sheet".to_string(), sheet_property());
    }
    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn address_property() -> Value {
    json!({
        "type": "string",
        "description": "Cell address in A1 notation, e.g. 'B3'"
    })
}

fn range_property() -> Value {
    json!({
        "type": "string",
        "description": "Range in A1 notation, e.g. 'A1:D10'"
    })
}

/// Every tool the assistant understands.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "read_cell",
            description: "Read one cell: content type, displayed value and formula text.",
            input_schema: object(json!({ "address": address_property() }), &["address"]),
        },
        ToolSpec {
            name: "read_range",
            description: "Read a rectangular range as a row-major grid of cells. Refused when the range exceeds the configured cell limit.",
            input_schema: object(json!({ "range": range_property() }), &["range"]),
        },
        ToolSpec {
            name: "write_cell",
            description: "Write a value to a cell. Text starting with '=' becomes a formula, numbers become numbers, anything else is text.",
            input_schema: object(
                json!({
                    "address": address_property(),
                    "value": {
                        "type": "string",
                        "description": "Value or formula to write"
                    }
                }),
                &["address", "value"],
            ),
        },
        ToolSpec {
            name: "get_all_formulas",
            description: "List every formula cell in the sheet's used area with its value and the cells it references.",
            input_schema: object(json!({}), &[]),
        },
        ToolSpec {
            name: "get_cell_precedents",
            description: "Cells referenced by the formula in a cell.",
            input_schema: object(json!({ "address": address_property() }), &["address"]),
        },
        ToolSpec {
            name: "get_cell_dependents",
            description: "Formula cells that reference a cell.",
            input_schema: object(json!({ "address": address_property() }), &["address"]),
        },
        ToolSpec {
            name: "analyze_structure",
            description: "Classify formula cells into inputs, intermediates and outputs, with the formula chain and an evaluation order.",
            input_schema: object(json!({}), &[]),
        },
        ToolSpec {
            name: "detect_errors",
            description: "Find formula cells showing a calculation error such as #DIV/0! or #REF!.",
            input_schema: object(json!({ "range": range_property() }), &[]),
        },
        ToolSpec {
            name: "explain_error",
            description: "Explain the calculation error in a cell: what it means, the values of its precedents and a suggested fix.",
            input_schema: object(json!({ "address": address_property() }), &["address"]),
        },
        ToolSpec {
            name: "detect_and_explain",
            description: "Find calculation errors and explain each one.",
            input_schema: object(json!({ "range": range_property() }), &[]),
        },
        ToolSpec {
            name: "column_statistics",
            description: "Count, sum, mean, min, max and sample standard deviation of the numbers in a column.",
            input_schema: object(
                json!({
                    "column": {
                        "type": "string",
                        "pattern": "^[A-Za-z]+$",
                        "description": "Column letters, e.g. 'C'"
                    }
                }),
                &["column"],
            ),
        },
        ToolSpec {
            name: "detect_outliers",
            description: "Flag numbers whose z-score exceeds a threshold. Needs a minimum number of samples.",
            input_schema: object(
                json!({
                    "range": range_property(),
                    "z_threshold": {
                        "type": "number",
                        "exclusiveMinimum": 0,
                        "description": "z-score threshold (default: 3.0)"
                    }
                }),
                &["range"],
            ),
        },
        ToolSpec {
            name: "detect_duplicates",
            description: "Values appearing more than once in a range, most frequent first.",
            input_schema: object(json!({ "range": range_property() }), &["range"]),
        },
        ToolSpec {
            name: "snapshot_range",
            description: "Capture content and formatting of a range so it can be restored later.",
            input_schema: object(
                json!({
                    "range": range_property(),
                    "max_cells": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Refuse ranges larger than this (default: configured limit)"
                    }
                }),
                &["range"],
            ),
        },
        ToolSpec {
            name: "list_sheets",
            description: "Names of all sheets and the active one.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    ]
}

/// Look up a tool definition by name.
pub fn find_tool(name: &str) -> Option<ToolSpec> {
    tool_specs().into_iter().find(|t| t.name == name)
}

/// Check `arguments` against the tool's input schema.
pub fn validate_arguments(name: &str, arguments: &Value) -> SheetResult<()> {
    let spec = find_tool(name)
        .ok_or_else(|| SheetError::InvalidArguments(format!("Unknown tool: {}", name)))?;

    let compiled = JSONSchema::compile(&spec.input_schema).map_err(|e| {
        SheetError::InvalidArguments(format!("Failed to compile schema for {}: {}", name, e))
    })?;

    if let Err(errors) = compiled.validate(arguments) {
        let messages: Vec<String> = errors.map(|e| format!("  - {}", e)).collect();
        return Err(SheetError::InvalidArguments(format!(
            "{}:\n{}",
            name,
            messages.join("\n")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_schema_compiles() {
        for spec in tool_specs() {
            assert!(
                JSONSchema::compile(&spec.input_schema).is_ok(),
                "schema for {} does not compile",
                spec.name
            );
        }
    }

    #[test]
    fn test_tool_names_unique() {
        let specs = tool_specs();
        let mut names: Vec<&str> = specs.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), specs.len());
        assert_eq!(specs.len(), 15);
    }

    #[test]
    fn test_validate_accepts_good_arguments() {
        assert!(validate_arguments("read_cell", &json!({ "address": "A1" })).is_ok());
        assert!(validate_arguments("detect_errors", &json!({})).is_ok());
        assert!(validate_arguments(
            "detect_outliers",
            &json!({ "range": "A1:A20", "z_threshold": 2.5, "sheet": "Data" })
        )
        .is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_arguments() {
        assert!(validate_arguments("read_cell", &json!({})).is_err());
        assert!(validate_arguments("read_cell", &json!({ "address": 3 })).is_err());
        assert!(validate_arguments("column_statistics", &json!({ "column": "A1" })).is_err());
        assert!(validate_arguments("list_sheets", &json!({ "extra": true })).is_err());
    }

    #[test]
    fn test_validate_unknown_tool() {
        let err = validate_arguments("format_cells", &json!({})).unwrap_err();
        assert!(err.to_string().contains("Unknown tool"));
    }
}
