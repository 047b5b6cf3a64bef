//! Cellsense MCP Server
//!
//! Model Context Protocol server exposing the spreadsheet analysis tools to AI
//! agents. One workbook is loaded at startup and kept in memory.
//!
//! ## Tools
//!
//! - `read_cell`, `read_range`, `write_cell`, `snapshot_range`, `list_sheets`
//! - `get_all_formulas`, `get_cell_precedents`, `get_cell_dependents`
//! - `analyze_structure`
//! - `detect_errors`, `explain_error`, `detect_and_explain`
//! - `column_statistics`, `detect_outliers`, `detect_duplicates`
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "cellsense": {
//!       "command": "cellsense-mcp",
//!       "args": ["--workbook", "model.xlsx"]
//!     }
//!   }
//! }
//! ```

pub mod server;

pub use server::{run_mcp_server_sync, CellsenseMcpServer};
