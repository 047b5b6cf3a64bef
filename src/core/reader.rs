//! Cell reader and writer.
//!
//! Resolves addresses through the bridge and turns cell handles into plain
//! [`CellSnapshot`] values. Every read goes to the document; nothing is cached.

use chrono::Utc;
use tracing::debug;

use crate::bridge::{Bridge, CellHandle};
use crate::config::AnalysisConfig;
use crate::core::address::{parse_address, parse_range, CellAddress, CellRange};
use crate::error::{SheetError, SheetResult};
use crate::types::{CellSnapshot, CellStyle, CellValue, ContentType, Literal, RangeSnapshot};

/// Classify typed input before writing it: formulas start with `=`, finite
/// numbers are numeric, everything else is text.
pub fn classify_literal(text: &str) -> Literal {
    if text.starts_with('=') {
        return Literal::Formula(text.to_string());
    }
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && !text.trim().is_empty() => Literal::Numeric(n),
        _ => Literal::Text(text.to_string()),
    }
}

/// Refuse ranges above `max_cells` before any cell is touched.
pub fn check_range_size(range: &CellRange, max_cells: usize) -> SheetResult<()> {
    let cells = range.cell_count();
    if cells > max_cells {
        return Err(SheetError::RangeTooLarge {
            range: range.to_string(),
            cells,
            max: max_cells,
        });
    }
    Ok(())
}

/// Build a snapshot from a handle using the display-value rules:
/// formulas show their number when it is non-zero, otherwise their string form.
pub fn snapshot_of<C: CellHandle>(cell: &C, with_style: bool) -> CellSnapshot {
    let content_type = cell.content_type();
    let value = match content_type {
        ContentType::Empty => CellValue::Empty,
        ContentType::Numeric => CellValue::Number(cell.numeric_value()),
        ContentType::Text => CellValue::Text(cell.string_value()),
        ContentType::Formula => {
            let n = cell.numeric_value();
            if n != 0.0 {
                CellValue::Number(n)
            } else {
                CellValue::Text(cell.string_value())
            }
        }
    };
    let formula = match content_type {
        ContentType::Formula => Some(cell.formula_text()),
        _ => None,
    };

    CellSnapshot {
        address: cell.address(),
        content_type,
        value,
        formula,
        style: with_style.then(|| cell.style()),
    }
}

fn attach_address(address: &CellAddress, err: SheetError) -> SheetError {
    match err {
        SheetError::UnknownSheet(_) | SheetError::CellAccess { .. } => err,
        other => SheetError::cell_access(address.to_string(), other),
    }
}

/// Read-only view of a document.
pub struct CellReader<'a, B: Bridge> {
    bridge: &'a B,
    config: &'a AnalysisConfig,
}

impl<'a, B: Bridge> CellReader<'a, B> {
    pub fn new(bridge: &'a B, config: &'a AnalysisConfig) -> Self {
        Self { bridge, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.config
    }

    /// `None` means the active sheet; a named sheet must exist.
    pub fn resolve_sheet(&self, sheet: Option<&str>) -> SheetResult<String> {
        match sheet {
            None => self.bridge.active_sheet(),
            Some(name) => {
                if self.bridge.sheet_names()?.iter().any(|s| s == name) {
                    Ok(name.to_string())
                } else {
                    Err(SheetError::UnknownSheet(name.to_string()))
                }
            }
        }
    }

    pub fn sheet_names(&self) -> SheetResult<Vec<String>> {
        self.bridge.sheet_names()
    }

    pub fn used_area(&self, sheet: &str) -> SheetResult<Option<CellRange>> {
        let area = self.bridge.used_area(sheet)?;
        debug!(sheet, used_area = ?area.map(|a| a.to_string()), "used area");
        Ok(area)
    }

    pub(crate) fn handle(&self, sheet: &str, address: CellAddress) -> SheetResult<B::Cell> {
        self.bridge
            .cell(sheet, address)
            .map_err(|e| attach_address(&address, e))
    }

    pub fn read_at(&self, sheet: &str, address: CellAddress) -> SheetResult<CellSnapshot> {
        Ok(snapshot_of(&self.handle(sheet, address)?, false))
    }

    /// Engine error number of a cell, 0 when it is not in an error state.
    pub fn error_code_at(&self, sheet: &str, address: CellAddress) -> SheetResult<u32> {
        Ok(self.handle(sheet, address)?.error_code())
    }

    pub fn read_cell(&self, sheet: Option<&str>, address: &str) -> SheetResult<CellSnapshot> {
        let address = parse_address(address)?;
        let sheet = self.resolve_sheet(sheet)?;
        self.read_at(&sheet, address)
    }

    /// Row-major grid, both endpoints inclusive. Bounded by `max_cells`.
    pub fn read_range(
        &self,
        sheet: Option<&str>,
        range: &str,
    ) -> SheetResult<Vec<Vec<CellSnapshot>>> {
        let range = parse_range(range)?;
        check_range_size(&range, self.config.max_cells)?;
        let sheet = self.resolve_sheet(sheet)?;
        self.read_grid(&sheet, &range)
    }

    /// Unbounded grid read for internal scans.
    pub(crate) fn read_grid(
        &self,
        sheet: &str,
        range: &CellRange,
    ) -> SheetResult<Vec<Vec<CellSnapshot>>> {
        range
            .rows()
            .map(|row| {
                range
                    .columns()
                    .map(|column| self.read_at(sheet, CellAddress::new(column, row)))
                    .collect()
            })
            .collect()
    }

    /// Capture content and style of a range for a later restore. Refuses, without
    /// reading anything, when the range holds more than `max_cells` cells.
    pub fn snapshot_range(
        &self,
        sheet: Option<&str>,
        range: &str,
        max_cells: usize,
    ) -> SheetResult<RangeSnapshot> {
        let range = parse_range(range)?;
        check_range_size(&range, max_cells)?;
        let sheet = self.resolve_sheet(sheet)?;

        let cells = range
            .cells()
            .map(|address| Ok(snapshot_of(&self.handle(&sheet, address)?, true)))
            .collect::<SheetResult<Vec<_>>>()?;

        Ok(RangeSnapshot {
            sheet,
            range: range.to_string(),
            taken_at: Utc::now(),
            cells,
        })
    }
}

/// Write access to a document.
pub struct CellWriter<'a, B: Bridge> {
    bridge: &'a mut B,
    config: &'a AnalysisConfig,
}

impl<'a, B: Bridge> CellWriter<'a, B> {
    pub fn new(bridge: &'a mut B, config: &'a AnalysisConfig) -> Self {
        Self { bridge, config }
    }

    fn resolve_sheet(&self, sheet: Option<&str>) -> SheetResult<String> {
        CellReader::new(&*self.bridge, self.config).resolve_sheet(sheet)
    }

    fn write_literal(
        &mut self,
        sheet: &str,
        address: CellAddress,
        text: &str,
    ) -> SheetResult<Literal> {
        let literal = classify_literal(text);
        let result = match &literal {
            Literal::Numeric(n) => self.bridge.set_number(sheet, address, *n),
            Literal::Text(t) => self.bridge.set_text(sheet, address, t),
            Literal::Formula(f) => self.bridge.set_formula(sheet, address, f),
        };
        result.map_err(|e| attach_address(&address, e))?;
        Ok(literal)
    }

    /// Write one value, classified by [`classify_literal`].
    pub fn write_cell(
        &mut self,
        sheet: Option<&str>,
        address: &str,
        text: &str,
    ) -> SheetResult<Literal> {
        let address = parse_address(address)?;
        let sheet = self.resolve_sheet(sheet)?;
        self.write_literal(&sheet, address, text)
    }

    /// Write a row-major block whose shape must match the range exactly.
    pub fn write_range(
        &mut self,
        sheet: Option<&str>,
        range: &str,
        rows: &[Vec<String>],
    ) -> SheetResult<usize> {
        let parsed = parse_range(range)?;
        check_range_size(&parsed, self.config.max_cells)?;
        let shape_ok =
            rows.len() == parsed.height() && rows.iter().all(|r| r.len() == parsed.width());
        if !shape_ok {
            return Err(SheetError::InvalidRange(format!(
                "{} expects {} rows of {} values",
                range,
                parsed.height(),
                parsed.width()
            )));
        }
        let sheet = self.resolve_sheet(sheet)?;

        let mut written = 0;
        for (row, values) in parsed.rows().zip(rows) {
            for (column, text) in parsed.columns().zip(values) {
                self.write_literal(&sheet, CellAddress::new(column, row), text)?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Put back content and style captured by [`CellReader::snapshot_range`].
    pub fn restore_snapshot(&mut self, snapshot: &RangeSnapshot) -> SheetResult<usize> {
        let sheet = self.resolve_sheet(Some(&snapshot.sheet))?;
        for cell in &snapshot.cells {
            let address = cell.address;
            let result = match (cell.content_type, &cell.formula, &cell.value) {
                (ContentType::Formula, Some(formula), _) => {
                    self.bridge.set_formula(&sheet, address, formula)
                }
                (ContentType::Numeric, _, CellValue::Number(n)) => {
                    self.bridge.set_number(&sheet, address, *n)
                }
                (ContentType::Text, _, value) => {
                    self.bridge.set_text(&sheet, address, &value.display())
                }
                _ => self.bridge.clear(&sheet, address),
            };
            result.map_err(|e| attach_address(&address, e))?;

            let style = cell.style.clone().unwrap_or_else(CellStyle::default);
            self.bridge
                .set_style(&sheet, address, &style)
                .map_err(|e| attach_address(&address, e))?;
        }
        Ok(snapshot.cells.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::faulty::FaultyBridge;
    use crate::bridge::{CachedValue, Workbook};
    use pretty_assertions::assert_eq;

    fn workbook() -> Workbook {
        let mut wb = Workbook::with_sheet("Sheet1");
        let sheet = wb.active_sheet_mut().unwrap();
        sheet.set("A1", "10").unwrap();
        sheet.set("A2", "label").unwrap();
        sheet
            .set_formula("A3", "=A1*2", CachedValue::Number(20.0))
            .unwrap();
        sheet
            .set_formula("A4", "=A1-A1", CachedValue::Number(0.0))
            .unwrap();
        sheet
            .set_formula("A5", "=UPPER(A2)", CachedValue::Text("LABEL".into()))
            .unwrap();
        wb
    }

    #[test]
    fn test_classify_literal() {
        assert_eq!(classify_literal("3.5"), Literal::Numeric(3.5));
        assert_eq!(classify_literal(" 42 "), Literal::Numeric(42.0));
        assert_eq!(classify_literal("=A1"), Literal::Formula("=A1".into()));
        assert_eq!(classify_literal("abc"), Literal::Text("abc".into()));
        assert_eq!(classify_literal(""), Literal::Text(String::new()));
        assert_eq!(classify_literal("inf"), Literal::Text("inf".into()));
        assert_eq!(classify_literal("NaN"), Literal::Text("NaN".into()));
    }

    #[test]
    fn test_read_cell_content_types() {
        let wb = workbook();
        let config = AnalysisConfig::default();
        let reader = CellReader::new(&wb, &config);

        let a1 = reader.read_cell(None, "A1").unwrap();
        assert_eq!(a1.content_type, ContentType::Numeric);
        assert_eq!(a1.value, CellValue::Number(10.0));
        assert!(a1.formula.is_none());

        let a2 = reader.read_cell(None, "a2").unwrap();
        assert_eq!(a2.value, CellValue::Text("label".into()));

        let a3 = reader.read_cell(Some("Sheet1"), "A3").unwrap();
        assert_eq!(a3.content_type, ContentType::Formula);
        assert_eq!(a3.value, CellValue::Number(20.0));
        assert_eq!(a3.formula.as_deref(), Some("=A1*2"));

        let empty = reader.read_cell(None, "Z100").unwrap();
        assert_eq!(empty.content_type, ContentType::Empty);
        assert_eq!(empty.value, CellValue::Empty);
    }

    #[test]
    fn test_formula_zero_and_text_fall_back_to_string() {
        let wb = workbook();
        let config = AnalysisConfig::default();
        let reader = CellReader::new(&wb, &config);

        assert_eq!(
            reader.read_cell(None, "A4").unwrap().value,
            CellValue::Text("0".into())
        );
        assert_eq!(
            reader.read_cell(None, "A5").unwrap().value,
            CellValue::Text("LABEL".into())
        );
    }

    #[test]
    fn test_invalid_address_before_bridge() {
        let wb = Workbook::new();
        let config = AnalysisConfig::default();
        let reader = CellReader::new(&wb, &config);
        // An empty workbook would fail at the bridge; the codec error comes first.
        assert!(matches!(
            reader.read_cell(None, "1A"),
            Err(SheetError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_unknown_sheet() {
        let wb = workbook();
        let config = AnalysisConfig::default();
        let reader = CellReader::new(&wb, &config);
        assert!(matches!(
            reader.read_cell(Some("Missing"), "A1"),
            Err(SheetError::UnknownSheet(_))
        ));
    }

    #[test]
    fn test_read_range_grid_shape() {
        let wb = workbook();
        let config = AnalysisConfig::default();
        let reader = CellReader::new(&wb, &config);

        let grid = reader.read_range(None, "A1:B3").unwrap();
        assert_eq!(grid.len(), 3);
        assert!(grid.iter().all(|row| row.len() == 2));
        assert_eq!(grid[2][0].address.to_string(), "A3");
        assert_eq!(grid[0][1].content_type, ContentType::Empty);
    }

    #[test]
    fn test_read_range_reversed_is_empty() {
        let wb = workbook();
        let config = AnalysisConfig::default();
        let reader = CellReader::new(&wb, &config);
        assert!(reader.read_range(None, "B3:A1").unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_too_large_is_refused() {
        let wb = workbook();
        let config = AnalysisConfig::default();
        let reader = CellReader::new(&wb, &config);

        let err = reader.snapshot_range(None, "A1:T20", 300).unwrap_err();
        match err {
            SheetError::RangeTooLarge { cells, max, .. } => {
                assert_eq!(cells, 400);
                assert_eq!(max, 300);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_refused_ranges_read_no_cells() {
        let bridge = FaultyBridge::new(workbook());
        let config = AnalysisConfig {
            max_cells: 10,
            ..AnalysisConfig::default()
        };
        let reader = CellReader::new(&bridge, &config);

        assert!(matches!(
            reader.snapshot_range(None, "A1:T20", 300),
            Err(SheetError::RangeTooLarge { .. })
        ));
        assert!(matches!(
            reader.read_range(None, "A1:C4"),
            Err(SheetError::RangeTooLarge { .. })
        ));
        assert_eq!(bridge.total_reads(), 0);

        reader.snapshot_range(None, "A1:A3", 300).unwrap();
        assert_eq!(bridge.total_reads(), 3);
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut wb = workbook();
        wb.active_sheet_mut()
            .unwrap()
            .set_cell_style(
                "A1",
                CellStyle {
                    bold: Some(true),
                    ..CellStyle::default()
                },
            )
            .unwrap();
        let config = AnalysisConfig::default();

        let snapshot = CellReader::new(&wb, &config)
            .snapshot_range(None, "A1:A3", 300)
            .unwrap();
        assert_eq!(snapshot.cells.len(), 3);
        assert_eq!(snapshot.cells[0].style.as_ref().unwrap().bold, Some(true));

        {
            let mut writer = CellWriter::new(&mut wb, &config);
            writer.write_cell(None, "A1", "99").unwrap();
            writer.write_cell(None, "A2", "changed").unwrap();
            writer.write_cell(None, "A3", "").unwrap();
            writer.restore_snapshot(&snapshot).unwrap();
        }

        let reader = CellReader::new(&wb, &config);
        assert_eq!(
            reader.read_cell(None, "A1").unwrap().value,
            CellValue::Number(10.0)
        );
        assert_eq!(
            reader.read_cell(None, "A2").unwrap().value,
            CellValue::Text("label".into())
        );
        assert_eq!(
            reader.read_cell(None, "A3").unwrap().formula.as_deref(),
            Some("=A1*2")
        );
    }

    #[test]
    fn test_write_cell_dispatches_by_literal() {
        let mut wb = Workbook::with_sheet("Sheet1");
        let config = AnalysisConfig::default();
        let mut writer = CellWriter::new(&mut wb, &config);

        assert_eq!(
            writer.write_cell(None, "A1", "5").unwrap(),
            Literal::Numeric(5.0)
        );
        assert_eq!(
            writer.write_cell(None, "A2", "=A1+1").unwrap(),
            Literal::Formula("=A1+1".into())
        );
        assert_eq!(
            writer.write_cell(None, "A3", "five").unwrap(),
            Literal::Text("five".into())
        );

        let reader = CellReader::new(&wb, &config);
        assert_eq!(
            reader.read_cell(None, "A2").unwrap().content_type,
            ContentType::Formula
        );
    }

    #[test]
    fn test_write_range_checks_shape_and_size() {
        let mut wb = Workbook::with_sheet("Sheet1");
        let config = AnalysisConfig {
            max_cells: 4,
            ..AnalysisConfig::default()
        };
        let mut writer = CellWriter::new(&mut wb, &config);

        let rows = vec![
            vec!["1".to_string(), "2".to_string()],
            vec!["3".to_string(), "=A1+B1".to_string()],
        ];
        assert_eq!(writer.write_range(None, "A1:B2", &rows).unwrap(), 4);
        assert!(matches!(
            writer.write_range(None, "A1:B1", &rows),
            Err(SheetError::InvalidRange(_))
        ));
        assert!(matches!(
            writer.write_range(None, "A1:C2", &rows),
            Err(SheetError::RangeTooLarge { .. })
        ));
    }
}
