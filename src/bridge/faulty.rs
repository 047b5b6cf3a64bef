//! Test bridge over a [`Workbook`] that counts cell reads and fails chosen ones.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::bridge::{Bridge, MemoryCell, Workbook};
use crate::core::address::{CellAddress, CellRange};
use crate::error::{SheetError, SheetResult};
use crate::types::CellStyle;

pub(crate) struct FaultyBridge {
    inner: Workbook,
    /// Address -> reads that succeed before every further read fails.
    failing: BTreeMap<CellAddress, usize>,
    reads: RefCell<BTreeMap<CellAddress, usize>>,
}

impl FaultyBridge {
    pub(crate) fn new(inner: Workbook) -> Self {
        Self {
            inner,
            failing: BTreeMap::new(),
            reads: RefCell::new(BTreeMap::new()),
        }
    }

    /// Fail every read of `address` after the first `after` succeed.
    pub(crate) fn fail(mut self, address: &str, after: usize) -> Self {
        if let Ok(address) = address.parse() {
            self.failing.insert(address, after);
        }
        self
    }

    pub(crate) fn total_reads(&self) -> usize {
        self.reads.borrow().values().sum()
    }
}

impl Bridge for FaultyBridge {
    type Cell = MemoryCell;

    fn active_sheet(&self) -> SheetResult<String> {
        self.inner.active_sheet()
    }

    fn sheet_names(&self) -> SheetResult<Vec<String>> {
        self.inner.sheet_names()
    }

    fn cell(&self, sheet: &str, address: CellAddress) -> SheetResult<MemoryCell> {
        let mut reads = self.reads.borrow_mut();
        let count = reads.entry(address).or_insert(0);
        *count += 1;
        match self.failing.get(&address) {
            Some(&after) if *count > after => {
                Err(SheetError::Bridge(format!("cell {} is locked", address)))
            }
            _ => self.inner.cell(sheet, address),
        }
    }

    fn used_area(&self, sheet: &str) -> SheetResult<Option<CellRange>> {
        self.inner.used_area(sheet)
    }

    fn set_number(&mut self, sheet: &str, address: CellAddress, value: f64) -> SheetResult<()> {
        self.inner.set_number(sheet, address, value)
    }

    fn set_text(&mut self, sheet: &str, address: CellAddress, text: &str) -> SheetResult<()> {
        self.inner.set_text(sheet, address, text)
    }

    fn set_formula(
        &mut self,
        sheet: &str,
        address: CellAddress,
        formula: &str,
    ) -> SheetResult<()> {
        self.inner.set_formula(sheet, address, formula)
    }

    fn clear(&mut self, sheet: &str, address: CellAddress) -> SheetResult<()> {
        self.inner.clear(sheet, address)
    }

    fn set_style(
        &mut self,
        sheet: &str,
        address: CellAddress,
        style: &CellStyle,
    ) -> SheetResult<()> {
        self.inner.set_style(sheet, address, style)
    }
}
