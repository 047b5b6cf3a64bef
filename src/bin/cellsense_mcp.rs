//! Cellsense MCP Server binary
//!
//! Model Context Protocol server for AI agent integration.
//! Run with: `cellsense-mcp --workbook model.xlsx`
//!
//! Configure in an MCP client:
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

use std::path::PathBuf;

use clap::Parser;
use cellsense::config::AnalysisConfig;
use cellsense::mcp::run_mcp_server_sync;
use cellsense::Workbook;

#[derive(Parser, Debug)]
#[command(name = "cellsense-mcp")]
#[command(version)]
#[command(about = "Cellsense MCP Server - spreadsheet analysis tools over stdio JSON-RPC")]
struct Args {
    /// Workbook to load (.xlsx, .xls, .ods)
    #[arg(short, long, env = "CELLSENSE_WORKBOOK")]
    workbook: PathBuf,

    /// Analysis configuration file (YAML)
    #[arg(short, long, env = "CELLSENSE_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries JSON-RPC only
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cellsense=info".into()),
        )
        .try_init();

    let config = AnalysisConfig::load_or_default(args.config.as_deref())?;
    let workbook = Workbook::open(&args.workbook)?;

    run_mcp_server_sync(workbook, config);
    Ok(())
}
