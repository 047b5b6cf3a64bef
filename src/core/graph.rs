//! Formula dependency graph.
//!
//! A formula's precedents are the cells its text references; a cell's
//! dependents are the formulas that reference it. Two ways to query them:
//!
//! - free functions ([`get_all_formulas`], [`precedents_of`], [`dependents_of`])
//!   rescan the used area on every call, so they always see the live document;
//! - [`DependencyGraph`] scans once and keeps forward and reverse adjacency for
//!   repeated queries within one analysis session. It is a snapshot: rebuild it
//!   after any edit.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::bridge::{Bridge, CellHandle};
use crate::core::address::{parse_address, CellAddress};
use crate::core::reader::{snapshot_of, CellReader};
use crate::core::references::{collect_precedents, references_cell};
use crate::error::SheetResult;
use crate::types::{ContentType, FormulaRecord};

fn precedents_for<B: Bridge>(reader: &CellReader<'_, B>, formula: &str) -> Vec<CellAddress> {
    let config = reader.config();
    collect_precedents(formula, config.expand_ranges, config.max_cells)
}

/// Every formula cell in the sheet's used area, row-major.
pub fn get_all_formulas<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: &str,
) -> SheetResult<Vec<FormulaRecord>> {
    let Some(area) = reader.used_area(sheet)? else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for address in area.cells() {
        let cell = reader.handle(sheet, address)?;
        if cell.content_type() != ContentType::Formula {
            continue;
        }
        let snapshot = snapshot_of(&cell, false);
        let formula = cell.formula_text();
        records.push(FormulaRecord {
            address,
            precedents: precedents_for(reader, &formula),
            formula,
            value: snapshot.value,
        });
    }

    debug!(sheet, formulas = records.len(), "scanned formulas");
    Ok(records)
}

/// Cells referenced by the formula at `address`; empty for non-formula cells.
pub fn precedents_of<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: &str,
    address: CellAddress,
) -> SheetResult<Vec<CellAddress>> {
    let cell = reader.handle(sheet, address)?;
    if cell.content_type() != ContentType::Formula {
        return Ok(Vec::new());
    }
    Ok(precedents_for(reader, &cell.formula_text()))
}

/// Formula cells whose text references `address`. Rescans the used area.
pub fn dependents_of<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: &str,
    address: CellAddress,
) -> SheetResult<Vec<CellAddress>> {
    let expand = reader.config().expand_ranges;
    Ok(get_all_formulas(reader, sheet)?
        .into_iter()
        .filter(|record| {
            if expand {
                record.precedents.contains(&address)
            } else {
                references_cell(&record.formula, &address)
            }
        })
        .map(|record| record.address)
        .collect())
}

/// String-addressed form of [`precedents_of`] for callers outside the core.
pub fn get_cell_precedents<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    address: &str,
) -> SheetResult<Vec<CellAddress>> {
    let address = parse_address(address)?;
    let sheet = reader.resolve_sheet(sheet)?;
    precedents_of(reader, &sheet, address)
}

/// String-addressed form of [`dependents_of`] for callers outside the core.
pub fn get_cell_dependents<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    address: &str,
) -> SheetResult<Vec<CellAddress>> {
    let address = parse_address(address)?;
    let sheet = reader.resolve_sheet(sheet)?;
    dependents_of(reader, &sheet, address)
}

/// One scan of a sheet's formulas with both adjacency directions materialized.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    sheet: String,
    records: Vec<FormulaRecord>,
    index: HashMap<CellAddress, usize>,
    dependents: HashMap<CellAddress, Vec<CellAddress>>,
}

impl DependencyGraph {
    pub fn build<B: Bridge>(reader: &CellReader<'_, B>, sheet: &str) -> SheetResult<Self> {
        let records = get_all_formulas(reader, sheet)?;
        Ok(Self::from_records(sheet, records))
    }

    pub fn from_records(sheet: impl Into<String>, records: Vec<FormulaRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        let mut dependents: HashMap<CellAddress, Vec<CellAddress>> = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            index.insert(record.address, i);
            for precedent in &record.precedents {
                dependents.entry(*precedent).or_default().push(record.address);
            }
        }

        Self {
            sheet: sheet.into(),
            records,
            index,
            dependents,
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Formula records in scan order.
    pub fn formulas(&self) -> &[FormulaRecord] {
        &self.records
    }

    pub fn formula(&self, address: &CellAddress) -> Option<&FormulaRecord> {
        self.index.get(address).map(|&i| &self.records[i])
    }

    pub fn is_formula(&self, address: &CellAddress) -> bool {
        self.index.contains_key(address)
    }

    pub fn precedents_of(&self, address: &CellAddress) -> &[CellAddress] {
        self.formula(address)
            .map(|r| r.precedents.as_slice())
            .unwrap_or(&[])
    }

    /// Dependents in scan order.
    pub fn dependents_of(&self, address: &CellAddress) -> &[CellAddress] {
        self.dependents
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Formula cells ordered so each comes after the formula cells it reads.
    ///
    /// Cells on a reference cycle have no such order; they are emitted next to
    /// each other in scan order. Cycles are not reported here.
    pub fn evaluation_order(&self) -> Vec<CellAddress> {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.records.len(), 0);
        let nodes: Vec<NodeIndex> = (0..self.records.len()).map(|i| graph.add_node(i)).collect();

        // Edges point from a formula to the formula cells it reads, so
        // tarjan's reverse-topological output lists precedents first.
        for (i, record) in self.records.iter().enumerate() {
            for precedent in &record.precedents {
                if let Some(&j) = self.index.get(precedent) {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
            }
        }

        tarjan_scc(&graph)
            .into_iter()
            .flat_map(|mut component| {
                component.sort_by_key(|node| graph[*node]);
                component
                    .into_iter()
                    .map(|node| self.records[graph[node]].address)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
