//! Cellsense API Server binary
//!
//! HTTP REST API over the spreadsheet analysis tools.

use std::path::PathBuf;

use clap::Parser;
use cellsense::api::{run_api_server, ApiConfig, AppState};
use cellsense::config::AnalysisConfig;
use cellsense::{Assistant, Workbook};

#[derive(Parser, Debug)]
#[command(name = "cellsense-server")]
#[command(version)]
#[command(about = "Cellsense API Server - HTTP REST API for spreadsheet formula analysis")]
#[command(long_about = r#"
Cellsense API Server - HTTP REST API

Loads one workbook and serves the analysis tools for it:
  - GET  /api/v1/tools      - Tool names, descriptions and input schemas
  - POST /api/v1/tools/call - Run one tool: {"name": ..., "arguments": {...}}

Additional endpoints:
  - GET  /health            - Health check
  - GET  /version           - Server version info
  - GET  /                  - API documentation

Features:
  - CORS enabled for cross-origin requests
  - Graceful shutdown on SIGINT/SIGTERM
  - JSON response format with request IDs
  - Tracing and structured logging

Example usage:
  cellsense-server --workbook model.xlsx
  cellsense-server --workbook model.xlsx --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/tools/call \
    -H "Content-Type: application/json" \
    -d '{"name": "detect_and_explain", "arguments": {}}'
"#)]
struct Args {
    /// Workbook to load (.xlsx, .xls, .ods)
    #[arg(short, long, env = "CELLSENSE_WORKBOOK")]
    workbook: PathBuf,

    /// Analysis configuration file (YAML)
    #[arg(short, long, env = "CELLSENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "CELLSENSE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "CELLSENSE_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let analysis = AnalysisConfig::load_or_default(args.config.as_deref())?;
    let workbook = Workbook::open(&args.workbook)?;
    let state = AppState::new(
        args.workbook.display().to_string(),
        Assistant::new(workbook, analysis),
    );

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config, state).await
}
