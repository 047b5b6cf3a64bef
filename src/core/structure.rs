//! Input / intermediate / output classification of a sheet's formula cells.

use std::collections::BTreeSet;

use tracing::info;

use crate::bridge::Bridge;
use crate::core::address::CellAddress;
use crate::core::graph::DependencyGraph;
use crate::core::reader::CellReader;
use crate::error::SheetResult;
use crate::types::{FormulaChainEntry, FormulaRecord, StructuralClassification, StructureReport};

/// Partition the cells touched by `records`.
///
/// - input: referenced by some formula, holds no formula itself
/// - output: holds a formula no other formula references
/// - intermediate: every other formula cell
///
/// Cycles are not special-cased: members reference each other and land in
/// intermediate. A formula that only references itself stays an output.
pub fn classify(records: &[FormulaRecord]) -> StructuralClassification {
    let formula_cells: BTreeSet<CellAddress> = records.iter().map(|r| r.address).collect();

    let mut referenced = BTreeSet::new();
    let mut referenced_by_others = BTreeSet::new();
    for record in records {
        for precedent in &record.precedents {
            referenced.insert(*precedent);
            if *precedent != record.address {
                referenced_by_others.insert(*precedent);
            }
        }
    }

    let output_cells: BTreeSet<CellAddress> = formula_cells
        .difference(&referenced_by_others)
        .copied()
        .collect();

    StructuralClassification {
        input_cells: referenced.difference(&formula_cells).copied().collect(),
        intermediate_cells: formula_cells.difference(&output_cells).copied().collect(),
        output_cells,
    }
}

fn summarize(sheet: &str, formulas: usize, classification: &StructuralClassification) -> String {
    format!(
        "{}: {} formula cells, {} inputs, {} intermediates, {} outputs",
        sheet,
        formulas,
        classification.input_cells.len(),
        classification.intermediate_cells.len(),
        classification.output_cells.len()
    )
}

/// Classification, formula chain in scan order and a dependency-respecting
/// evaluation order for one sheet.
pub fn analyze_structure<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
) -> SheetResult<StructureReport> {
    let sheet = reader.resolve_sheet(sheet)?;
    let graph = DependencyGraph::build(reader, &sheet)?;
    let classification = classify(graph.formulas());

    let formula_chain = graph
        .formulas()
        .iter()
        .map(|record| FormulaChainEntry {
            cell: record.address,
            formula: record.formula.clone(),
            depends_on: record.precedents.clone(),
        })
        .collect::<Vec<_>>();

    let summary = summarize(&sheet, formula_chain.len(), &classification);
    info!("{}", summary);

    Ok(StructureReport {
        evaluation_order: graph.evaluation_order(),
        sheet,
        classification,
        formula_chain,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Workbook;
    use crate::config::AnalysisConfig;
    use crate::core::address::parse_address;
    use pretty_assertions::assert_eq;

    fn set(list: &[&str]) -> BTreeSet<CellAddress> {
        list.iter().map(|a| parse_address(a).unwrap()).collect()
    }

    fn analyze(cells: &[(&str, &str)]) -> StructureReport {
        let mut wb = Workbook::with_sheet("Sheet1");
        let sheet = wb.active_sheet_mut().unwrap();
        for (address, input) in cells {
            sheet.set(address, input).unwrap();
        }
        let config = AnalysisConfig::default();
        let reader = CellReader::new(&wb, &config);
        analyze_structure(&reader, None).unwrap()
    }

    #[test]
    fn test_linear_chain() {
        let report = analyze(&[("A1", "1"), ("B1", "=A1"), ("C1", "=B1")]);
        assert_eq!(report.classification.input_cells, set(&["A1"]));
        assert_eq!(report.classification.intermediate_cells, set(&["B1"]));
        assert_eq!(report.classification.output_cells, set(&["C1"]));
        assert_eq!(
            report.summary,
            "Sheet1: 2 formula cells, 1 inputs, 1 intermediates, 1 outputs"
        );
    }

    #[test]
    fn test_referenced_empty_cell_is_input() {
        let report = analyze(&[("B1", "=A1+A2")]);
        assert_eq!(report.classification.input_cells, set(&["A1", "A2"]));
        assert_eq!(report.classification.output_cells, set(&["B1"]));
    }

    #[test]
    fn test_inert_cells_excluded() {
        let report = analyze(&[("A1", "1"), ("D9", "note"), ("B1", "=A1*2")]);
        let all: BTreeSet<CellAddress> = report
            .classification
            .input_cells
            .iter()
            .chain(&report.classification.intermediate_cells)
            .chain(&report.classification.output_cells)
            .copied()
            .collect();
        assert!(!all.contains(&parse_address("D9").unwrap()));
    }

    #[test]
    fn test_cycle_members_are_intermediate() {
        let report = analyze(&[("A1", "=B1"), ("B1", "=A1")]);
        assert_eq!(report.classification.intermediate_cells, set(&["A1", "B1"]));
        assert!(report.classification.output_cells.is_empty());
        assert!(report.classification.input_cells.is_empty());
    }

    #[test]
    fn test_self_reference_stays_output() {
        let report = analyze(&[("A1", "=A1+1")]);
        assert_eq!(report.classification.output_cells, set(&["A1"]));
        assert!(report.classification.input_cells.is_empty());
    }

    #[test]
    fn test_chain_is_scan_order_and_evaluation_is_dependency_order() {
        let report = analyze(&[("A1", "=A2"), ("A2", "=A3"), ("A3", "5")]);
        let chain: Vec<String> = report
            .formula_chain
            .iter()
            .map(|e| e.cell.to_string())
            .collect();
        assert_eq!(chain, vec!["A1", "A2"]);
        let order: Vec<String> = report
            .evaluation_order
            .iter()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(order, vec!["A2", "A1"]);
    }

    #[test]
    fn test_empty_sheet() {
        let report = analyze(&[]);
        assert!(report.formula_chain.is_empty());
        assert!(report.classification.output_cells.is_empty());
    }
}
