//! A1 address codec.
//!
//! Converts between spreadsheet notation ("A1", "AB10:AC20") and zero-based
//! (column, row) pairs. Column letters form a bijective base-26 numeral:
//! "A" = 1 ... "Z" = 26, "AA" = 27, so there is no zero digit.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{SheetError, SheetResult};

/// A single cell position, zero-based on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellAddress {
    // Field order gives row-major ordering for the derived Ord.
    pub row: usize,
    pub column: usize,
}

impl CellAddress {
    pub fn new(column: usize, row: usize) -> Self {
        Self { row, column }
    }

    /// Shift by a signed offset; `None` when the result would leave the sheet.
    pub fn offset(&self, columns: isize, rows: isize) -> Option<CellAddress> {
        let column = self.column.checked_add_signed(columns)?;
        let row = self.row.checked_add_signed(rows)?;
        Some(CellAddress::new(column, row))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.column), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s)
    }
}

impl TryFrom<String> for CellAddress {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_address(&value)
    }
}

impl From<CellAddress> for String {
    fn from(address: CellAddress) -> Self {
        address.to_string()
    }
}

/// An inclusive rectangle of cells. Start and end are kept exactly as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self { start, end }
    }

    pub fn single(address: CellAddress) -> Self {
        Self {
            start: address,
            end: address,
        }
    }

    /// Whether end lies before start on either axis. Such ranges are not
    /// swapped; they simply cover no cells.
    pub fn is_reversed(&self) -> bool {
        self.end.column < self.start.column || self.end.row < self.start.row
    }

    pub fn width(&self) -> usize {
        if self.is_reversed() {
            0
        } else {
            self.end.column - self.start.column + 1
        }
    }

    pub fn height(&self) -> usize {
        if self.is_reversed() {
            0
        } else {
            self.end.row - self.start.row + 1
        }
    }

    /// Number of covered cells, saturating instead of overflowing.
    pub fn cell_count(&self) -> usize {
        self.width().saturating_mul(self.height())
    }

    pub fn contains(&self, address: &CellAddress) -> bool {
        !self.is_reversed()
            && (self.start.column..=self.end.column).contains(&address.column)
            && (self.start.row..=self.end.row).contains(&address.row)
    }

    /// Row indices covered, empty for a reversed range.
    pub fn rows(&self) -> std::ops::Range<usize> {
        if self.is_reversed() {
            0..0
        } else {
            self.start.row..self.end.row + 1
        }
    }

    /// Column indices covered, empty for a reversed range.
    pub fn columns(&self) -> std::ops::Range<usize> {
        if self.is_reversed() {
            0..0
        } else {
            self.start.column..self.end.column + 1
        }
    }

    /// Overlap of two ranges; `None` when they share no cell.
    pub fn intersect(&self, other: &CellRange) -> Option<CellRange> {
        if self.is_reversed() || other.is_reversed() {
            return None;
        }
        let start = CellAddress::new(
            self.start.column.max(other.start.column),
            self.start.row.max(other.start.row),
        );
        let end = CellAddress::new(
            self.end.column.min(other.end.column),
            self.end.row.min(other.end.row),
        );
        let overlap = CellRange::new(start, end);
        (!overlap.is_reversed()).then_some(overlap)
    }

    /// Every covered address in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> {
        let columns = self.columns();
        self.rows()
            .flat_map(move |row| columns.clone().map(move |column| CellAddress::new(column, row)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_range(s)
    }
}

fn address_re() -> &'static Regex {
    static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
    ADDRESS_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<digits>[0-9]+)$").expect("address regex must compile")
    })
}

/// Parse "B3" into column 1, row 2. Case-insensitive, surrounding whitespace ignored.
pub fn parse_address(text: &str) -> SheetResult<CellAddress> {
    let trimmed = text.trim();
    let invalid = || SheetError::InvalidAddress(text.to_string());

    let caps = address_re().captures(trimmed).ok_or_else(invalid)?;
    let column = letters_to_column(&caps["letters"]).ok_or_else(invalid)?;
    let row = caps["digits"]
        .parse::<usize>()
        .ok()
        .and_then(|r| r.checked_sub(1))
        .ok_or_else(invalid)?;

    Ok(CellAddress::new(column, row))
}

/// Inverse of [`parse_address`].
pub fn format_address(address: &CellAddress) -> String {
    address.to_string()
}

/// Parse "A1:D10", or a bare "A1" which yields a single-cell range.
pub fn parse_range(text: &str) -> SheetResult<CellRange> {
    let trimmed = text.trim();
    let invalid = || SheetError::InvalidRange(text.to_string());

    let mut parts = trimmed.split(':');
    let first = parts.next().ok_or_else(invalid)?;
    let second = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }

    let start = parse_address(first).map_err(|_| invalid())?;
    match second {
        None => Ok(CellRange::single(start)),
        Some(end) => {
            let end = parse_address(end).map_err(|_| invalid())?;
            Ok(CellRange::new(start, end))
        }
    }
}

/// Decode column letters ("A" -> 0, "AA" -> 26). `None` on overflow or non-letters.
pub fn letters_to_column(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc = 0usize;
    for c in letters.bytes() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    acc.checked_sub(1)
}

/// Encode a zero-based column index (0 -> "A", 25 -> "Z", 26 -> "AA").
pub fn column_to_letters(column: usize) -> String {
    let mut letters = Vec::new();
    let mut n = column as u128 + 1;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
