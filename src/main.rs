use cellsense::cli;
use cellsense::config::AnalysisConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cellsense")]
#[command(about = "Formula dependency and structural analysis for spreadsheets.")]
#[command(long_about = "Cellsense - spreadsheet formula analysis
Precedents | Dependents | Inputs vs outputs | Error explanations | Range statistics

Reads the values the spreadsheet engine last computed; never recalculates.
Supports .xlsx, .xls and .ods workbooks.

COMMANDS:
  read        - Show one cell or a range
  formulas    - List every formula with the cells it reads
  precedents  - Cells a formula reads
  dependents  - Formulas that read a cell
  structure   - Classify cells into inputs, intermediates and outputs
  errors      - Find and explain every calculation error
  explain     - Explain the error in one cell
  stats       - Count, sum, mean, min, max, stddev of a column or range
  outliers    - Values whose z-score exceeds a threshold
  duplicates  - Values that appear more than once
  watch       - Re-run error detection whenever the file is saved

EXAMPLES:
  cellsense structure model.xlsx --sheet Forecast
  cellsense errors model.xlsx
  cellsense precedents model.xlsx D12
  cellsense outliers model.xlsx B2:B200 --threshold 2.5

CONFIGURATION:
  --config analysis.yaml (or CELLSENSE_CONFIG) with any of:
    max_cells: 10000
    outlier_z_threshold: 3.0
    min_outlier_samples: 8
    expand_ranges: false")]
#[command(version)]
struct Cli {
    /// Analysis configuration file (YAML)
    #[arg(short, long, global = true, env = "CELLSENSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one cell (B3) or a range (A1:D10)
    Read {
        /// Path to the workbook
        file: PathBuf,

        /// Cell address or range
        target: String,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// List every formula cell in row-major order
    Formulas {
        /// Path to the workbook
        file: PathBuf,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Cells referenced by a formula
    Precedents {
        /// Path to the workbook
        file: PathBuf,

        /// Formula cell address
        cell: String,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Formula cells that reference a cell
    Dependents {
        /// Path to the workbook
        file: PathBuf,

        /// Cell address
        cell: String,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    #[command(long_about = "Classify the cells a sheet's formulas touch.

  Inputs         - referenced by a formula, not formulas themselves
  Intermediates  - formulas referenced by other formulas
  Outputs        - formulas nothing else references

Use --verbose to also print the formula chain (scan order) and the
evaluation order (precedents before dependents).")]
    /// Input / intermediate / output classification
    Structure {
        /// Path to the workbook
        file: PathBuf,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Print the formula chain and evaluation order
        #[arg(short, long)]
        verbose: bool,
    },

    /// Find and explain every calculation error
    Errors {
        /// Path to the workbook
        file: PathBuf,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Limit the scan to a range (defaults to the used area)
        #[arg(short, long)]
        range: Option<String>,
    },

    /// Explain the calculation error in one cell
    Explain {
        /// Path to the workbook
        file: PathBuf,

        /// Cell address
        cell: String,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Statistics of a column (B) or range (B2:B20)
    Stats {
        /// Path to the workbook
        file: PathBuf,

        /// Column letters or range
        target: String,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Values whose z-score exceeds a threshold
    Outliers {
        /// Path to the workbook
        file: PathBuf,

        /// Range to scan
        range: String,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Z-score threshold (defaults to outlier_z_threshold from config)
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Values that occur more than once in a range
    Duplicates {
        /// Path to the workbook
        file: PathBuf,

        /// Range to scan
        range: String,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    #[command(long_about = "Watch a workbook and re-run error detection on every save.

FEATURES:
  ✅ Real-time file monitoring
  ✅ Debounced updates (waits for the save to complete)
  ✅ Survives half-written files

Press Ctrl+C to stop.")]
    /// Re-run error detection when the workbook changes
    Watch {
        /// Path to the workbook
        file: PathBuf,

        /// Sheet name (defaults to the active sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Clear the screen between runs
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cellsense=warn".into()),
        )
        .try_init();

    let config = AnalysisConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Read {
            file,
            target,
            sheet,
        } => cli::read(file, target, sheet, &config)?,

        Commands::Formulas { file, sheet } => cli::formulas(file, sheet, &config)?,

        Commands::Precedents { file, cell, sheet } => {
            cli::precedents(file, cell, sheet, &config)?
        }

        Commands::Dependents { file, cell, sheet } => {
            cli::dependents(file, cell, sheet, &config)?
        }

        Commands::Structure {
            file,
            sheet,
            verbose,
        } => cli::structure(file, sheet, verbose, &config)?,

        Commands::Errors { file, sheet, range } => cli::errors(file, sheet, range, &config)?,

        Commands::Explain { file, cell, sheet } => cli::explain(file, cell, sheet, &config)?,

        Commands::Stats {
            file,
            target,
            sheet,
        } => cli::stats(file, target, sheet, &config)?,

        Commands::Outliers {
            file,
            range,
            sheet,
            threshold,
        } => cli::outliers(file, range, sheet, threshold, &config)?,

        Commands::Duplicates { file, range, sheet } => {
            cli::duplicates(file, range, sheet, &config)?
        }

        Commands::Watch {
            file,
            sheet,
            verbose,
        } => cli::watch(file, sheet, verbose, &config)?,
    }

    Ok(())
}
