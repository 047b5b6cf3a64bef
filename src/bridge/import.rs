//! Workbook files → in-memory document (calamine).
//!
//! Formula cells keep the result cached in the file, which is what the
//! authoring application last computed. Nothing is recalculated on load.

use std::path::Path;

use calamine::{open_workbook_auto, CellErrorType, CellType, Data, Range, Reader};
use tracing::{debug, info};

use crate::bridge::memory::{CachedValue, Sheet, Workbook};
use crate::core::address::CellAddress;
use crate::core::diagnostics::{
    describe_code, lookup_token, ERR_DIV_ZERO, ERR_INVALID_ARGUMENT, ERR_NA, ERR_NAME, ERR_REF,
    ERR_VALUE,
};
use crate::error::{SheetError, SheetResult};

const ERR_NUM: u32 = 503;
const ERR_NULL: u32 = 521;

/// Engine number for a calamine error value.
fn error_number(error: &CellErrorType) -> u32 {
    match error {
        CellErrorType::Div0 => ERR_DIV_ZERO,
        CellErrorType::NA => ERR_NA,
        CellErrorType::Name => ERR_NAME,
        CellErrorType::Null => ERR_NULL,
        CellErrorType::Num => ERR_NUM,
        CellErrorType::Ref => ERR_REF,
        CellErrorType::Value => ERR_VALUE,
        _ => ERR_INVALID_ARGUMENT,
    }
}

/// A string that is exactly an error display token, e.g. `#DIV/0!`.
fn error_token(text: &str) -> Option<u32> {
    let text = text.trim();
    lookup_token(text).filter(|&n| describe_code(n).code.eq_ignore_ascii_case(text))
}

fn cached_result(value: Option<&Data>) -> CachedValue {
    match value {
        None | Some(Data::Empty) => CachedValue::Number(0.0),
        Some(Data::Float(f)) => CachedValue::Number(*f),
        Some(Data::Int(i)) => CachedValue::Number(*i as f64),
        Some(Data::Bool(b)) => CachedValue::Number(if *b { 1.0 } else { 0.0 }),
        Some(Data::DateTime(dt)) => CachedValue::Number(dt.as_f64()),
        Some(Data::Error(e)) => CachedValue::Error(error_number(e)),
        Some(Data::String(s)) => match error_token(s) {
            Some(number) => CachedValue::Error(number),
            None => CachedValue::Text(s.clone()),
        },
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => CachedValue::Text(s.clone()),
    }
}

fn origin<T: CellType>(range: &Range<T>) -> (usize, usize) {
    let (row, column) = range.start().unwrap_or_default();
    (row as usize, column as usize)
}

fn load_sheet(sheet: &mut Sheet, values: &Range<Data>, formulas: Option<&Range<String>>) {
    let (row0, col0) = origin(values);
    for (row, column, value) in values.used_cells() {
        let address = CellAddress::new(col0 + column, row0 + row);
        match value {
            Data::Empty => {}
            Data::String(s) if s.is_empty() => {}
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                sheet.put_text(address, s)
            }
            Data::Float(f) => sheet.put_number(address, *f),
            Data::Int(i) => sheet.put_number(address, *i as f64),
            Data::Bool(b) => sheet.put_number(address, if *b { 1.0 } else { 0.0 }),
            Data::DateTime(dt) => sheet.put_number(address, dt.as_f64()),
            Data::Error(e) => sheet.put_text(address, &describe_code(error_number(e)).code),
        }
    }

    let Some(formulas) = formulas else {
        return;
    };
    let (f_row0, f_col0) = origin(formulas);
    for (row, column, formula) in formulas.used_cells() {
        if formula.is_empty() {
            continue;
        }
        let (abs_row, abs_col) = (f_row0 + row, f_col0 + column);
        let cached = values.get_value((abs_row as u32, abs_col as u32));
        // put_formula adds the leading '=' calamine strips.
        sheet.put_formula(
            CellAddress::new(abs_col, abs_row),
            formula,
            cached_result(cached),
        );
    }
}

impl Workbook {
    /// Load every sheet of an .xlsx, .xlsm, .xls or .ods file. The first sheet
    /// becomes the active one.
    pub fn open(path: impl AsRef<Path>) -> SheetResult<Self> {
        let path = path.as_ref();
        let mut source = open_workbook_auto(path).map_err(|e| {
            SheetError::Workbook(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let mut workbook = Workbook::new();
        for name in source.sheet_names().to_vec() {
            let values = source.worksheet_range(&name).map_err(|e| {
                SheetError::Workbook(format!("Failed to read sheet '{}': {}", name, e))
            })?;
            let formulas = source.worksheet_formula(&name).ok();
            let sheet = workbook.add_sheet(name.as_str());
            load_sheet(sheet, &values, formulas.as_ref());
            debug!(sheet = %name, cells = sheet.len(), "loaded sheet");
        }

        if workbook.sheets().is_empty() {
            return Err(SheetError::Workbook(format!(
                "{} contains no worksheets",
                path.display()
            )));
        }

        info!(path = %path.display(), sheets = workbook.sheets().len(), "workbook loaded");
        Ok(workbook)
    }
}
