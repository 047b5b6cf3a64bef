//! Cellsense - formula dependency and structural analysis for spreadsheets
//!
//! This library reads a workbook through a small [`bridge::Bridge`] trait and
//! answers the questions an assistant asks about it: which cells a formula
//! reads, which formulas read a cell, which cells are inputs or outputs, why a
//! cell shows an error, and what a range looks like statistically.
//!
//! # Features
//!
//! - Precedent / dependent analysis from formula text
//! - Input / intermediate / output classification and evaluation order
//! - Calculation error catalog with explanations and fix suggestions
//! - Column and range statistics, z-score outliers, duplicate values
//! - One closed set of tool calls shared by the CLI, MCP and HTTP surfaces
//!
//! # Example
//!
//! ```no_run
//! use cellsense::config::AnalysisConfig;
//! use cellsense::core::structure::analyze_structure;
//! use cellsense::core::CellReader;
//! use cellsense::Workbook;
//!
//! let workbook = Workbook::open("model.xlsx")?;
//! let config = AnalysisConfig::default();
//! let reader = CellReader::new(&workbook, &config);
//!
//! let report = analyze_structure(&reader, None)?;
//! println!("{}", report.summary);
//! println!("Outputs: {:?}", report.classification.output_cells);
//! # Ok::<(), cellsense::error::SheetError>(())
//! ```

pub mod api;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod mcp;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use bridge::Workbook;
pub use config::AnalysisConfig;
pub use error::{SheetError, SheetResult};
pub use tools::{Assistant, ToolCall};
pub use types::{CellSnapshot, CellValue, ContentType};
