use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::address::CellAddress;

//==============================================================================
// Cell content
//==============================================================================

/// What a cell holds, as reported by the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Empty,
    Numeric,
    Text,
    Formula,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Empty => "empty",
            ContentType::Numeric => "numeric",
            ContentType::Text => "text",
            ContentType::Formula => "formula",
        }
    }
}

/// A displayed cell value. Serializes as `null`, a number, or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// String form used for duplicate counting and display.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Format a number for display, dropping a trailing ".0".
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// Presentation attributes carried by snapshots so an undo can restore them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// One read of one cell. Never cached: every read produces a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub address: CellAddress,
    pub content_type: ContentType,
    pub value: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

/// Text typed by a user or model, classified before it is written.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Numeric(f64),
    Text(String),
    Formula(String),
}

/// Content and style of a rectangle, captured for a later restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSnapshot {
    pub sheet: String,
    pub range: String,
    pub taken_at: DateTime<Utc>,
    pub cells: Vec<CellSnapshot>,
}

//==============================================================================
// Dependency analysis
//==============================================================================

/// A formula cell and the cells its text references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRecord {
    pub address: CellAddress,
    pub formula: String,
    pub value: CellValue,
    /// Deduplicated, first-seen order.
    pub precedents: Vec<CellAddress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaChainEntry {
    pub cell: CellAddress,
    pub formula: String,
    pub depends_on: Vec<CellAddress>,
}

/// Input / intermediate / output partition of the cells touched by formulas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuralClassification {
    pub input_cells: BTreeSet<CellAddress>,
    pub intermediate_cells: BTreeSet<CellAddress>,
    pub output_cells: BTreeSet<CellAddress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureReport {
    pub sheet: String,
    #[serde(flatten)]
    pub classification: StructuralClassification,
    /// Row-major discovery order, not dependency order.
    pub formula_chain: Vec<FormulaChainEntry>,
    /// Formula cells with precedents before dependents.
    pub evaluation_order: Vec<CellAddress>,
    pub summary: String,
}

//==============================================================================
// Calculation errors
//==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Display token, e.g. `#DIV/0!` or `Err:502`.
    pub code: String,
    /// Engine error number; 0 when only a textual token was available.
    pub number: u32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedError {
    pub address: CellAddress,
    pub formula: String,
    pub error: ErrorDescriptor,
}

/// A precedent as seen while explaining an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrecedentDetail {
    Read(CellSnapshot),
    Unreadable { address: String, value: String },
}

impl PrecedentDetail {
    pub fn snapshot(&self) -> Option<&CellSnapshot> {
        match self {
            PrecedentDetail::Read(snapshot) => Some(snapshot),
            PrecedentDetail::Unreadable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorExplanation {
    pub address: CellAddress,
    pub formula: String,
    pub error: ErrorDescriptor,
    pub precedents: Vec<PrecedentDetail>,
    pub suggestion: String,
}

/// One entry of a detect-and-explain batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExplainedError {
    Explained(ErrorExplanation),
    Bare {
        #[serde(flatten)]
        detected: DetectedError,
        explanation_error: String,
    },
}

//==============================================================================
// Statistics
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeStatistics {
    pub target: String,
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub standard_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub address: CellAddress,
    pub value: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub target: String,
    pub sample_count: usize,
    pub insufficient_data: bool,
    pub mean: Option<f64>,
    pub standard_deviation: f64,
    pub threshold: f64,
    pub outliers: Vec<Outlier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub value: String,
    pub count: usize,
    pub cells: Vec<CellAddress>,
}
