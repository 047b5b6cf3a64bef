//! Document bridge
//!
//! The analysis core never owns a spreadsheet. It talks to a live document
//! through [`Bridge`], one call per cell, and re-reads on every query.
//!
//! - [`memory::Workbook`] - in-process document, also what file loading produces
//! - [`import`] - calamine loader for .xlsx / .xls / .ods files

#[cfg(test)]
pub(crate) mod faulty;
pub mod import;
pub mod memory;

pub use memory::{CachedValue, MemoryCell, Sheet, Workbook};

use crate::core::address::{CellAddress, CellRange};
use crate::error::SheetResult;
use crate::types::{CellStyle, ContentType};

/// Read access to one resolved cell.
pub trait CellHandle {
    fn address(&self) -> CellAddress;
    fn content_type(&self) -> ContentType;
    /// Numeric value; 0 for text, empty and error cells.
    fn numeric_value(&self) -> f64;
    /// Display string; for formulas, the string form of the computed result.
    fn string_value(&self) -> String;
    /// Formula text including the leading `=`; empty for non-formula cells.
    fn formula_text(&self) -> String;
    /// Engine error number, 0 when the cell is not in an error state.
    fn error_code(&self) -> u32;
    fn style(&self) -> CellStyle;
}

/// Capabilities the host document exposes to the analysis core.
pub trait Bridge {
    type Cell: CellHandle;

    fn active_sheet(&self) -> SheetResult<String>;

    fn sheet_names(&self) -> SheetResult<Vec<String>>;

    fn cell(&self, sheet: &str, address: CellAddress) -> SheetResult<Self::Cell>;

    /// Smallest rectangle holding every non-empty cell; `None` for an empty sheet.
    fn used_area(&self, sheet: &str) -> SheetResult<Option<CellRange>>;

    fn set_number(&mut self, sheet: &str, address: CellAddress, value: f64) -> SheetResult<()>;

    fn set_text(&mut self, sheet: &str, address: CellAddress, text: &str) -> SheetResult<()>;

    fn set_formula(&mut self, sheet: &str, address: CellAddress, formula: &str)
        -> SheetResult<()>;

    fn clear(&mut self, sheet: &str, address: CellAddress) -> SheetResult<()>;

    fn set_style(&mut self, sheet: &str, address: CellAddress, style: &CellStyle)
        -> SheetResult<()>;
}
