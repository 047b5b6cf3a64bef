//! Cellsense API Server module
//!
//! HTTP REST API over the analysis tools.
//! Run with `cellsense-server --workbook model.xlsx`.

pub mod handlers;
pub mod server;

pub use server::{build_router, run_api_server, ApiConfig, AppState};
