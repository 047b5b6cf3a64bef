use crate::bridge::Workbook;
use crate::config::AnalysisConfig;
use crate::core::address::{letters_to_column, CellAddress};
use crate::core::diagnostics::{detect_and_explain, explain_error};
use crate::core::graph::{get_all_formulas, get_cell_dependents, get_cell_precedents};
use crate::core::reader::CellReader;
use crate::core::stats::{column_statistics, detect_duplicates, detect_outliers, range_statistics};
use crate::core::structure::analyze_structure;
use crate::error::{SheetError, SheetResult};
use crate::types::{
    format_number, CellSnapshot, ContentType, ErrorExplanation, ExplainedError, PrecedentDetail,
};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

fn open(file: &Path) -> SheetResult<Workbook> {
    let workbook = Workbook::open(file)?;
    println!("   Workbook: {}", file.display());
    Ok(workbook)
}

fn sheet_label(reader: &CellReader<'_, Workbook>, sheet: Option<&str>) -> SheetResult<String> {
    let sheet = reader.resolve_sheet(sheet)?;
    println!("   Sheet: {}\n", sheet.bright_blue().bold());
    Ok(sheet)
}

fn join_addresses<'a>(addresses: impl IntoIterator<Item = &'a CellAddress>) -> String {
    let joined: Vec<String> = addresses.into_iter().map(|a| a.to_string()).collect();
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined.join(", ")
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

fn print_snapshot(snapshot: &CellSnapshot) {
    let value = snapshot.value.display();
    match (&snapshot.content_type, &snapshot.formula) {
        (ContentType::Formula, Some(formula)) => println!(
            "   {} = {}  {}",
            snapshot.address.to_string().bright_blue().bold(),
            value.bold(),
            formula.dimmed()
        ),
        (ContentType::Empty, _) => println!(
            "   {} {}",
            snapshot.address.to_string().bright_blue().bold(),
            "(empty)".dimmed()
        ),
        _ => println!(
            "   {} = {}",
            snapshot.address.to_string().bright_blue().bold(),
            value.bold()
        ),
    }
}

/// Print one cell, or every cell of a range in row-major order.
pub fn read(
    file: PathBuf,
    target: String,
    sheet: Option<String>,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "📖 Cellsense - Read".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    if target.contains(':') {
        for row in reader.read_range(Some(&sheet), &target)? {
            for snapshot in &row {
                print_snapshot(snapshot);
            }
        }
    } else {
        print_snapshot(&reader.read_cell(Some(&sheet), &target)?);
    }
    Ok(())
}

/// List every formula cell in row-major order with its precedents.
pub fn formulas(file: PathBuf, sheet: Option<String>, config: &AnalysisConfig) -> SheetResult<()> {
    println!("{}", "🧮 Cellsense - Formulas".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    let records = get_all_formulas(&reader, &sheet)?;
    for record in &records {
        println!(
            "   {} {}",
            record.address.to_string().bright_blue().bold(),
            record.formula
        );
        println!("      value: {}", record.value.display().bold());
        println!("      reads: {}", join_addresses(&record.precedents));
    }
    println!(
        "\n{}",
        format!("✅ {} formula cells", records.len()).bold().green()
    );
    Ok(())
}

pub fn precedents(
    file: PathBuf,
    cell: String,
    sheet: Option<String>,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "⬅️  Cellsense - Precedents".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    let found = get_cell_precedents(&reader, Some(&sheet), &cell)?;
    println!(
        "   {} reads: {}",
        cell.to_ascii_uppercase().bright_blue().bold(),
        join_addresses(&found)
    );
    Ok(())
}

pub fn dependents(
    file: PathBuf,
    cell: String,
    sheet: Option<String>,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "➡️  Cellsense - Dependents".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    let found = get_cell_dependents(&reader, Some(&sheet), &cell)?;
    println!(
        "   {} is read by: {}",
        cell.to_ascii_uppercase().bright_blue().bold(),
        join_addresses(&found)
    );
    Ok(())
}

/// Input / intermediate / output partition and the formula chain.
pub fn structure(
    file: PathBuf,
    sheet: Option<String>,
    verbose: bool,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "🌳 Cellsense - Structure".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    let report = analyze_structure(&reader, Some(&sheet))?;
    let groups: [(&str, &BTreeSet<CellAddress>); 3] = [
        ("📥 Inputs:", &report.classification.input_cells),
        ("🔁 Intermediates:", &report.classification.intermediate_cells),
        ("📤 Outputs:", &report.classification.output_cells),
    ];
    for (title, cells) in groups {
        println!("{} {}", title.bold().cyan(), join_addresses(cells));
    }

    if verbose {
        println!("\n{}", "🧮 Formula Chain:".bold().cyan());
        for entry in &report.formula_chain {
            println!(
                "   {} {}  <- {}",
                entry.cell.to_string().bright_blue(),
                entry.formula,
                join_addresses(&entry.depends_on)
            );
        }
        println!("\n{}", "📋 Evaluation Order:".bold().cyan());
        println!("   {}", join_addresses(&report.evaluation_order));
    }

    println!("\n{}", format!("✅ {}", report.summary).bold().green());
    Ok(())
}

fn print_explanation(explanation: &ErrorExplanation) {
    println!(
        "   {} {} {}",
        "❌".red(),
        explanation.address.to_string().bright_blue().bold(),
        explanation.error.code.red().bold()
    );
    println!("      {}", explanation.formula);
    println!("      {}", explanation.error.description);
    for precedent in &explanation.precedents {
        match precedent {
            PrecedentDetail::Read(snapshot) => {
                let value = if snapshot.value.is_empty() {
                    "(empty)".to_string()
                } else {
                    snapshot.value.display()
                };
                println!("      {} = {}", snapshot.address, value);
            }
            PrecedentDetail::Unreadable { address, value } => {
                println!("      {} = {}", address, value.dimmed())
            }
        }
    }
    println!("      {} {}", "💡".yellow(), explanation.suggestion.yellow());
}

fn report_errors(
    reader: &CellReader<'_, Workbook>,
    sheet: &str,
    range: Option<&str>,
) -> SheetResult<usize> {
    let found = detect_and_explain(reader, Some(sheet), range)?;
    for entry in &found {
        match entry {
            ExplainedError::Explained(explanation) => print_explanation(explanation),
            ExplainedError::Bare {
                detected,
                explanation_error,
            } => {
                println!(
                    "   {} {} {}  {}",
                    "❌".red(),
                    detected.address.to_string().bright_blue().bold(),
                    detected.error.code.red().bold(),
                    explanation_error.dimmed()
                );
            }
        }
    }
    Ok(found.len())
}

/// Detect and explain every calculation error in the sheet or a range.
pub fn errors(
    file: PathBuf,
    sheet: Option<String>,
    range: Option<String>,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "🔍 Cellsense - Errors".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    let count = report_errors(&reader, &sheet, range.as_deref())?;
    if count == 0 {
        println!("{}", "✅ No calculation errors found".bold().green());
    } else {
        println!(
            "\n{}",
            format!("❌ Found {} calculation errors", count).bold().red()
        );
    }
    Ok(())
}

pub fn explain(
    file: PathBuf,
    cell: String,
    sheet: Option<String>,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "🔍 Cellsense - Explain".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    print_explanation(&explain_error(&reader, Some(&sheet), &cell)?);
    Ok(())
}

/// Statistics for a column (`B`) or a range (`B2:B20`).
pub fn stats(
    file: PathBuf,
    target: String,
    sheet: Option<String>,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "📊 Cellsense - Statistics".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    let result = if target.contains(':') {
        range_statistics(&reader, Some(&sheet), &target)?
    } else if letters_to_column(&target.to_ascii_uppercase()).is_some() {
        column_statistics(&reader, Some(&sheet), &target)?
    } else {
        return Err(SheetError::InvalidRange(target));
    };

    println!("   Target: {}", result.target.bright_blue().bold());
    println!("   Count:  {}", result.count);
    println!("   Sum:    {}", format_number(result.sum).bold());
    println!("   Mean:   {}", format_optional(result.mean).bold());
    println!("   Min:    {}", format_optional(result.min));
    println!("   Max:    {}", format_optional(result.max));
    println!("   StdDev: {}", format_number(result.standard_deviation));
    Ok(())
}

pub fn outliers(
    file: PathBuf,
    range: String,
    sheet: Option<String>,
    threshold: Option<f64>,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "📈 Cellsense - Outliers".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    let report = detect_outliers(&reader, Some(&sheet), &range, threshold)?;
    if report.insufficient_data {
        println!(
            "{}",
            format!(
                "⚠️  Only {} numeric values, need {} for outlier detection",
                report.sample_count, config.min_outlier_samples
            )
            .yellow()
        );
        return Ok(());
    }

    println!(
        "   {} values, mean {}, stddev {}, |z| > {}",
        report.sample_count,
        format_optional(report.mean),
        format_number(report.standard_deviation),
        format_number(report.threshold)
    );
    for outlier in &report.outliers {
        println!(
            "   {} {} = {}  (z = {:.2})",
            "⚠️ ".yellow(),
            outlier.address.to_string().bright_blue().bold(),
            format_number(outlier.value).bold(),
            outlier.z_score
        );
    }
    if report.outliers.is_empty() {
        println!("{}", "✅ No outliers".bold().green());
    }
    Ok(())
}

pub fn duplicates(
    file: PathBuf,
    range: String,
    sheet: Option<String>,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "👯 Cellsense - Duplicates".bold().green());
    let workbook = open(&file)?;
    let reader = CellReader::new(&workbook, config);
    let sheet = sheet_label(&reader, sheet.as_deref())?;

    let found = detect_duplicates(&reader, Some(&sheet), &range)?;
    for entry in &found {
        println!(
            "   {} x{}  {}",
            format!("\"{}\"", entry.value).bold(),
            entry.count,
            join_addresses(&entry.cells).dimmed()
        );
    }
    if found.is_empty() {
        println!("{}", "✅ No duplicate values".bold().green());
    }
    Ok(())
}

/// Re-run error detection whenever the workbook file changes.
pub fn watch(
    file: PathBuf,
    sheet: Option<String>,
    verbose: bool,
    config: &AnalysisConfig,
) -> SheetResult<()> {
    println!("{}", "👁️  Cellsense - Watch Mode".bold().green());
    println!("   Watching: {}", file.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !file.exists() {
        return Err(SheetError::Workbook(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let canonical_path = file.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| SheetError::Workbook("Cannot determine parent directory".to_string()))?;

    let (tx, rx) = channel();

    // Office suites save through a temp file and rename; debounce the burst.
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| SheetError::Workbook(format!("Failed to create file watcher: {}", e)))?;

    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| SheetError::Workbook(format!("Failed to watch directory: {}", e)))?;

    if verbose {
        println!(
            "   {} {}",
            "Watching directory:".cyan(),
            parent_dir.display()
        );
    }

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(&canonical_path, sheet.as_deref(), config);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && is_watched_file(&event.path, &canonical_path)
                });

                if relevant {
                    if verbose {
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_action(&canonical_path, sheet.as_deref(), config);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn is_watched_file(path: &Path, watched: &Path) -> bool {
    if let Ok(canonical) = path.canonicalize() {
        if canonical == watched {
            return true;
        }
    }
    path.file_name().is_some() && path.file_name() == watched.file_name()
}

/// One detection pass; failures are printed, never fatal, so the watch survives
/// a half-written file.
fn run_watch_action(file: &Path, sheet: Option<&str>, config: &AnalysisConfig) {
    let outcome = Workbook::open(file).and_then(|workbook| {
        let reader = CellReader::new(&workbook, config);
        let sheet = reader.resolve_sheet(sheet)?;
        report_errors(&reader, &sheet, None)
    });
    match outcome {
        Ok(0) => println!("{}", "✅ No calculation errors".bold().green()),
        Ok(count) => println!(
            "{}",
            format!("❌ {} calculation errors", count).bold().red()
        ),
        Err(e) => println!("{} {}", "❌ Analysis failed:".bold().red(), e),
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
