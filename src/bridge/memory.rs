//! In-process document.
//!
//! Formula cells keep the text plus the result the host engine last computed;
//! nothing here evaluates formulas.

use std::collections::BTreeMap;

use crate::bridge::{Bridge, CellHandle};
use crate::core::address::{parse_address, CellAddress, CellRange};
use crate::core::diagnostics::describe_code;
use crate::core::reader::classify_literal;
use crate::error::{SheetError, SheetResult};
use crate::types::{format_number, CellStyle, ContentType, Literal};

/// Last computed result of a formula cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Number(f64),
    Text(String),
    /// Engine error number (e.g. 532 for division by zero).
    Error(u32),
}

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Number(f64),
    Text(String),
    Formula { text: String, result: CachedValue },
}

#[derive(Debug, Clone, PartialEq, Default)]
struct StoredCell {
    content: Option<Content>,
    style: CellStyle,
}

/// A cell read out of a [`Workbook`]. Owns a copy, so later edits don't show through.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCell {
    address: CellAddress,
    content: Option<Content>,
    style: CellStyle,
}

impl CellHandle for MemoryCell {
    fn address(&self) -> CellAddress {
        self.address
    }

    fn content_type(&self) -> ContentType {
        match &self.content {
            None => ContentType::Empty,
            Some(Content::Number(_)) => ContentType::Numeric,
            Some(Content::Text(_)) => ContentType::Text,
            Some(Content::Formula { .. }) => ContentType::Formula,
        }
    }

    fn numeric_value(&self) -> f64 {
        match &self.content {
            Some(Content::Number(n)) => *n,
            Some(Content::Formula {
                result: CachedValue::Number(n),
                ..
            }) => *n,
            _ => 0.0,
        }
    }

    fn string_value(&self) -> String {
        match &self.content {
            None => String::new(),
            Some(Content::Number(n)) => format_number(*n),
            Some(Content::Text(s)) => s.clone(),
            Some(Content::Formula { result, .. }) => match result {
                CachedValue::Number(n) => format_number(*n),
                CachedValue::Text(s) => s.clone(),
                CachedValue::Error(code) => describe_code(*code).code,
            },
        }
    }

    fn formula_text(&self) -> String {
        match &self.content {
            Some(Content::Formula { text, .. }) => text.clone(),
            _ => String::new(),
        }
    }

    fn error_code(&self) -> u32 {
        match &self.content {
            Some(Content::Formula {
                result: CachedValue::Error(code),
                ..
            }) => *code,
            _ => 0,
        }
    }

    fn style(&self) -> CellStyle {
        self.style.clone()
    }
}

/// One worksheet: a sparse map of cells keyed in row-major order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<CellAddress, StoredCell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of cells holding content.
    pub fn len(&self) -> usize {
        self.cells.values().filter(|c| c.content.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enter text the way a user types it: `=...` is a formula, numbers are
    /// numbers, anything else is text, and an empty string clears the cell.
    pub fn set(&mut self, address: &str, input: &str) -> SheetResult<()> {
        let address = parse_address(address)?;
        match classify_literal(input) {
            Literal::Numeric(n) => self.put_number(address, n),
            Literal::Formula(f) => self.put_formula(address, &f, CachedValue::Number(0.0)),
            Literal::Text(t) if t.is_empty() => self.clear_content(address),
            Literal::Text(t) => self.put_text(address, &t),
        }
        Ok(())
    }

    /// Enter a formula together with the result the engine computed for it.
    pub fn set_formula(
        &mut self,
        address: &str,
        formula: &str,
        result: CachedValue,
    ) -> SheetResult<()> {
        let address = parse_address(address)?;
        self.put_formula(address, formula, result);
        Ok(())
    }

    /// Replace the cached result of an existing formula cell.
    pub fn set_formula_result(&mut self, address: &str, value: CachedValue) -> SheetResult<()> {
        let parsed = parse_address(address)?;
        match self.cells.get_mut(&parsed).and_then(|c| c.content.as_mut()) {
            Some(Content::Formula { result, .. }) => {
                *result = value;
                Ok(())
            }
            _ => Err(SheetError::cell_access(address, "cell does not contain a formula")),
        }
    }

    pub fn set_cell_style(&mut self, address: &str, style: CellStyle) -> SheetResult<()> {
        let address = parse_address(address)?;
        self.cells.entry(address).or_default().style = style;
        Ok(())
    }

    pub(crate) fn put_number(&mut self, address: CellAddress, value: f64) {
        self.cells.entry(address).or_default().content = Some(Content::Number(value));
    }

    pub(crate) fn put_text(&mut self, address: CellAddress, text: &str) {
        self.cells.entry(address).or_default().content = Some(Content::Text(text.to_string()));
    }

    pub(crate) fn put_formula(&mut self, address: CellAddress, formula: &str, result: CachedValue) {
        let text = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };
        self.cells.entry(address).or_default().content = Some(Content::Formula { text, result });
    }

    fn clear_content(&mut self, address: CellAddress) {
        let remove = match self.cells.get_mut(&address) {
            Some(cell) => {
                cell.content = None;
                cell.style.is_default()
            }
            None => false,
        };
        if remove {
            self.cells.remove(&address);
        }
    }

    fn put_style(&mut self, address: CellAddress, style: &CellStyle) {
        if style.is_default() && !self.cells.contains_key(&address) {
            return;
        }
        self.cells.entry(address).or_default().style = style.clone();
    }

    pub fn cell(&self, address: CellAddress) -> MemoryCell {
        let stored = self.cells.get(&address);
        MemoryCell {
            address,
            content: stored.and_then(|c| c.content.clone()),
            style: stored.map(|c| c.style.clone()).unwrap_or_default(),
        }
    }

    pub fn used_area(&self) -> Option<CellRange> {
        let mut occupied = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.content.is_some())
            .map(|(address, _)| *address);

        let first = occupied.next()?;
        let (mut min_col, mut max_col) = (first.column, first.column);
        let (mut min_row, mut max_row) = (first.row, first.row);
        for address in occupied {
            min_col = min_col.min(address.column);
            max_col = max_col.max(address.column);
            min_row = min_row.min(address.row);
            max_row = max_row.max(address.row);
        }

        Some(CellRange::new(
            CellAddress::new(min_col, min_row),
            CellAddress::new(max_col, max_row),
        ))
    }
}

/// An ordered collection of sheets with one active sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active: usize,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A workbook with one empty, active sheet.
    pub fn with_sheet(name: impl Into<String>) -> Self {
        Self {
            sheets: vec![Sheet::new(name)],
            active: 0,
        }
    }

    /// Get or create a sheet by name.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> &mut Sheet {
        let name = name.into();
        let index = match self.sheets.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[index]
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// The active sheet, for building fixtures.
    pub fn active_sheet_mut(&mut self) -> SheetResult<&mut Sheet> {
        let active = self.active;
        self.sheets
            .get_mut(active)
            .ok_or_else(|| SheetError::Bridge("workbook has no sheets".to_string()))
    }

    pub fn set_active(&mut self, name: &str) -> SheetResult<()> {
        self.active = self
            .sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SheetError::UnknownSheet(name.to_string()))?;
        Ok(())
    }

    fn require(&self, name: &str) -> SheetResult<&Sheet> {
        self.sheet(name)
            .ok_or_else(|| SheetError::UnknownSheet(name.to_string()))
    }

    fn require_mut(&mut self, name: &str) -> SheetResult<&mut Sheet> {
        self.sheet_mut(name)
            .ok_or_else(|| SheetError::UnknownSheet(name.to_string()))
    }
}

impl Bridge for Workbook {
    type Cell = MemoryCell;

    fn active_sheet(&self) -> SheetResult<String> {
        self.sheets
            .get(self.active)
            .map(|s| s.name.clone())
            .ok_or_else(|| SheetError::Bridge("workbook has no sheets".to_string()))
    }

    fn sheet_names(&self) -> SheetResult<Vec<String>> {
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }

    fn cell(&self, sheet: &str, address: CellAddress) -> SheetResult<MemoryCell> {
        Ok(self.require(sheet)?.cell(address))
    }

    fn used_area(&self, sheet: &str) -> SheetResult<Option<CellRange>> {
        Ok(self.require(sheet)?.used_area())
    }

    fn set_number(&mut self, sheet: &str, address: CellAddress, value: f64) -> SheetResult<()> {
        self.require_mut(sheet)?.put_number(address, value);
        Ok(())
    }

    fn set_text(&mut self, sheet: &str, address: CellAddress, text: &str) -> SheetResult<()> {
        let target = self.require_mut(sheet)?;
        if text.is_empty() {
            target.clear_content(address);
        } else {
            target.put_text(address, text);
        }
        Ok(())
    }

    fn set_formula(
        &mut self,
        sheet: &str,
        address: CellAddress,
        formula: &str,
    ) -> SheetResult<()> {
        // Without an engine the result is unknown until the host recalculates.
        self.require_mut(sheet)?
            .put_formula(address, formula, CachedValue::Number(0.0));
        Ok(())
    }

    fn clear(&mut self, sheet: &str, address: CellAddress) -> SheetResult<()> {
        self.require_mut(sheet)?.clear_content(address);
        Ok(())
    }

    fn set_style(
        &mut self,
        sheet: &str,
        address: CellAddress,
        style: &CellStyle,
    ) -> SheetResult<()> {
        self.require_mut(sheet)?.put_style(address, style);
        Ok(())
    }
}
