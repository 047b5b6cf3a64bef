//! Library-level analysis scenarios against the in-memory workbook

use cellsense::bridge::{CachedValue, Workbook};
use cellsense::config::AnalysisConfig;
use cellsense::core::address::parse_address;
use cellsense::core::diagnostics::{detect_and_explain, detect_errors, explain_error};
use cellsense::core::graph::{get_all_formulas, get_cell_dependents, get_cell_precedents};
use cellsense::core::stats::{column_statistics, detect_duplicates, detect_outliers};
use cellsense::core::structure::analyze_structure;
use cellsense::core::{CellReader, CellWriter, DependencyGraph};
use cellsense::types::{CellValue, ExplainedError, PrecedentDetail};
use cellsense::SheetError;
use pretty_assertions::assert_eq;

fn addrs(list: &[&str]) -> Vec<cellsense::core::CellAddress> {
    list.iter().map(|a| parse_address(a).unwrap()).collect()
}

/// A1=5, B1==A1*2, C1==B1+1
fn chain_workbook() -> Workbook {
    let mut wb = Workbook::with_sheet("Model");
    let sheet = wb.active_sheet_mut().unwrap();
    sheet.set("A1", "5").unwrap();
    sheet
        .set_formula("B1", "=A1*2", CachedValue::Number(10.0))
        .unwrap();
    sheet
        .set_formula("C1", "=B1+1", CachedValue::Number(11.0))
        .unwrap();
    wb
}

/// A1=0, B1=10, C1==B1/A1 showing #DIV/0!
fn div_zero_workbook() -> Workbook {
    let mut wb = Workbook::with_sheet("Sheet1");
    let sheet = wb.active_sheet_mut().unwrap();
    sheet.set("A1", "0").unwrap();
    sheet.set("B1", "10").unwrap();
    sheet
        .set_formula("C1", "=B1/A1", CachedValue::Error(532))
        .unwrap();
    wb
}

// ═══════════════════════════════════════════════════════════════════════════
// DIVISION BY ZERO
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_div_zero_is_detected_and_explained() {
    let wb = div_zero_workbook();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    let errors = detect_errors(&reader, None, None).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].address.to_string(), "C1");
    assert_eq!(errors[0].error.code, "#DIV/0!");
    assert_eq!(errors[0].error.number, 532);

    let explanation = explain_error(&reader, None, "C1").unwrap();
    assert_eq!(explanation.formula, "=B1/A1");
    let read: Vec<String> = explanation
        .precedents
        .iter()
        .filter_map(PrecedentDetail::snapshot)
        .map(|s| s.address.to_string())
        .collect();
    assert_eq!(read, vec!["B1", "A1"]);
    assert!(explanation.suggestion.contains("A1 is zero or empty"));
    assert!(explanation.suggestion.contains("=IF(A1=0;\"\";B1/A1)"));
}

#[test]
fn test_detect_and_explain_batch() {
    let wb = div_zero_workbook();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    let batch = detect_and_explain(&reader, Some("Sheet1"), None).unwrap();
    assert_eq!(batch.len(), 1);
    match &batch[0] {
        ExplainedError::Explained(e) => assert_eq!(e.error.code, "#DIV/0!"),
        other => panic!("expected an explanation, got {:?}", other),
    }
}

#[test]
fn test_clean_sheet_has_no_errors() {
    let wb = chain_workbook();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);
    assert!(detect_errors(&reader, None, None).unwrap().is_empty());
    assert!(matches!(
        explain_error(&reader, None, "B1"),
        Err(SheetError::NotAnError(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// STRUCTURE AND DEPENDENCIES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_chain_classification() {
    let wb = chain_workbook();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    let report = analyze_structure(&reader, None).unwrap();
    let c = &report.classification;
    assert_eq!(c.input_cells.iter().copied().collect::<Vec<_>>(), addrs(&["A1"]));
    assert_eq!(
        c.intermediate_cells.iter().copied().collect::<Vec<_>>(),
        addrs(&["B1"])
    );
    assert_eq!(c.output_cells.iter().copied().collect::<Vec<_>>(), addrs(&["C1"]));
    assert_eq!(report.evaluation_order, addrs(&["B1", "C1"]));
    assert!(report.summary.starts_with("Model:"));
}

#[test]
fn test_precedent_dependent_symmetry() {
    let mut wb = chain_workbook();
    wb.active_sheet_mut()
        .unwrap()
        .set_formula("D2", "=SUM(A1,B1,C1)", CachedValue::Number(26.0))
        .unwrap();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    for record in get_all_formulas(&reader, "Model").unwrap() {
        for precedent in &record.precedents {
            let dependents =
                get_cell_dependents(&reader, None, &precedent.to_string()).unwrap();
            assert!(
                dependents.contains(&record.address),
                "{} should list {} as a dependent",
                precedent,
                record.address
            );
        }
    }
}

#[test]
fn test_session_graph_matches_rescans() {
    let wb = chain_workbook();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);
    let graph = DependencyGraph::build(&reader, "Model").unwrap();

    for cell in ["A1", "B1", "C1"] {
        let address = parse_address(cell).unwrap();
        assert_eq!(
            graph.dependents_of(&address).to_vec(),
            get_cell_dependents(&reader, None, cell).unwrap()
        );
        assert_eq!(
            graph.precedents_of(&address).to_vec(),
            get_cell_precedents(&reader, None, cell).unwrap()
        );
    }
}

#[test]
fn test_cycle_members_stay_together() {
    let mut wb = Workbook::with_sheet("Sheet1");
    let sheet = wb.active_sheet_mut().unwrap();
    sheet.set_formula("A1", "=B1", CachedValue::Error(522)).unwrap();
    sheet.set_formula("B1", "=A1", CachedValue::Error(522)).unwrap();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    let report = analyze_structure(&reader, None).unwrap();
    assert_eq!(report.evaluation_order, addrs(&["A1", "B1"]));
    assert!(report.classification.input_cells.is_empty());

    let explanation = explain_error(&reader, None, "A1").unwrap();
    assert_eq!(explanation.error.number, 522);
    assert!(explanation.suggestion.contains("B1"));
}

// ═══════════════════════════════════════════════════════════════════════════
// STATISTICS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_column_statistics() {
    let mut wb = Workbook::with_sheet("Sheet1");
    let sheet = wb.active_sheet_mut().unwrap();
    sheet.set("B1", "Amount").unwrap();
    for (row, value) in ["1", "2", "3", "4", "5"].iter().enumerate() {
        sheet.set(&format!("B{}", row + 2), value).unwrap();
    }
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    let stats = column_statistics(&reader, None, "b").unwrap();
    assert_eq!(stats.target, "B");
    assert_eq!(stats.count, 5);
    assert_eq!(stats.sum, 15.0);
    assert_eq!(stats.mean, Some(3.0));
    assert_eq!(stats.min, Some(1.0));
    assert_eq!(stats.max, Some(5.0));
    assert!((stats.standard_deviation - 1.5811).abs() < 1e-4);
}

#[test]
fn test_outlier_detection() {
    let mut wb = Workbook::with_sheet("Sheet1");
    let sheet = wb.active_sheet_mut().unwrap();
    for row in 1..=15 {
        sheet.set(&format!("A{}", row), "10").unwrap();
    }
    sheet.set("A16", "100").unwrap();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    let report = detect_outliers(&reader, None, "A1:A16", None).unwrap();
    assert!(!report.insufficient_data);
    assert_eq!(report.outliers.len(), 1);
    assert_eq!(report.outliers[0].address.to_string(), "A16");
    assert!((report.outliers[0].z_score - 3.75).abs() < 1e-9);

    let small = detect_outliers(&reader, None, "A1:A3", None).unwrap();
    assert!(small.insufficient_data);
    assert!(small.outliers.is_empty());
}

#[test]
fn test_duplicates_by_display_value() {
    let mut wb = Workbook::with_sheet("Sheet1");
    let sheet = wb.active_sheet_mut().unwrap();
    sheet.set("A1", "x").unwrap();
    sheet.set("A2", "y").unwrap();
    sheet.set("A3", "x").unwrap();
    sheet.set("A4", "x").unwrap();
    sheet.set("A5", "y").unwrap();
    sheet.set("A6", "z").unwrap();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    let dups = detect_duplicates(&reader, None, "A1:A6").unwrap();
    assert_eq!(dups.len(), 2);
    assert_eq!(dups[0].value, "x");
    assert_eq!(dups[0].count, 3);
    assert_eq!(dups[1].value, "y");
    assert_eq!(dups[1].cells, addrs(&["A2", "A5"]));
}

// ═══════════════════════════════════════════════════════════════════════════
// READS, WRITES AND GUARDS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_range_too_large_is_refused() {
    let wb = chain_workbook();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);

    match reader.read_range(None, "A1:Z1000") {
        Err(SheetError::RangeTooLarge { cells, max, .. }) => {
            assert_eq!(cells, 26_000);
            assert_eq!(max, 10_000);
        }
        other => panic!("expected RangeTooLarge, got {:?}", other),
    }
    assert!(matches!(
        reader.snapshot_range(None, "A1:B2", 3),
        Err(SheetError::RangeTooLarge { .. })
    ));
}

#[test]
fn test_write_then_snapshot_restore() {
    let mut wb = chain_workbook();
    let config = AnalysisConfig::default();

    let snapshot = CellReader::new(&wb, &config)
        .snapshot_range(None, "A1:C1", config.max_cells)
        .unwrap();

    {
        let mut writer = CellWriter::new(&mut wb, &config);
        writer.write_cell(None, "A1", "hello").unwrap();
    }
    let reader = CellReader::new(&wb, &config);
    assert_eq!(
        reader.read_cell(None, "A1").unwrap().value,
        CellValue::Text("hello".into())
    );

    let mut writer = CellWriter::new(&mut wb, &config);
    writer.restore_snapshot(&snapshot).unwrap();
    let reader = CellReader::new(&wb, &config);
    assert_eq!(reader.read_cell(None, "A1").unwrap().value, CellValue::Number(5.0));
    assert_eq!(
        reader.read_cell(None, "B1").unwrap().formula.as_deref(),
        Some("=A1*2")
    );
}

#[test]
fn test_unknown_sheet_and_bad_address() {
    let wb = chain_workbook();
    let config = AnalysisConfig::default();
    let reader = CellReader::new(&wb, &config);
    assert!(matches!(
        reader.read_cell(Some("Missing"), "A1"),
        Err(SheetError::UnknownSheet(_))
    ));
    assert!(matches!(
        reader.read_cell(None, "A0"),
        Err(SheetError::InvalidAddress(_))
    ));
}
