//! Cell references inside formula text.
//!
//! Scans for `$?LETTERS$?DIGITS` tokens. Absolute markers are accepted and
//! dropped, so `$A$1` and `A1` name the same cell. Sheet-qualified references
//! (`Sheet2.A1`, `Sheet2!A1`) keep only the cell part and are treated as
//! same-sheet addresses.
//!
//! Tokens are rejected when glued to an identifier on either side, when they
//! are a function name (`LOG10(`), or when they are a sheet name (`Sheet2.`).
//! Text inside string literals is ignored.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::address::{letters_to_column, CellAddress, CellRange};

/// A reference token found in formula text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    start: usize,
    end: usize,
    address: CellAddress,
}

fn reference_re() -> &'static Regex {
    static REFERENCE_RE: OnceLock<Regex> = OnceLock::new();
    REFERENCE_RE.get_or_init(|| {
        Regex::new(r"\$?([A-Z]+)\$?([0-9]+)").expect("reference regex must compile")
    })
}

/// Blank out the contents of `"..."` literals (`""` is an escaped quote),
/// keeping byte offsets stable.
fn strip_string_literals(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut in_string = false;

    for ch in formula.chars() {
        if ch == '"' {
            // A doubled quote toggles twice and stays inside the literal.
            in_string = !in_string;
            out.push('"');
        } else if in_string {
            out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }

    out
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn tokens(formula: &str) -> Vec<Token> {
    let text = strip_string_literals(formula).to_ascii_uppercase();
    let bytes = text.as_bytes();

    reference_re()
        .captures_iter(&text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (start, end) = (whole.start(), whole.end());

            if start > 0 && is_identifier_byte(bytes[start - 1]) {
                return None;
            }
            if let Some(&next) = bytes.get(end) {
                if is_identifier_byte(next) || matches!(next, b'(' | b'.' | b'!') {
                    return None;
                }
            }

            let column = letters_to_column(&caps[1])?;
            let row = caps[2].parse::<usize>().ok()?.checked_sub(1)?;
            Some(Token {
                start,
                end,
                address: CellAddress::new(column, row),
            })
        })
        .collect()
}

/// Every reference in the formula, in order, duplicates kept, normalized to
/// plain `A1` form.
pub fn extract_references(formula: &str) -> Vec<String> {
    tokens(formula)
        .into_iter()
        .map(|t| t.address.to_string())
        .collect()
}

/// Distinct referenced cells in first-seen order.
///
/// With `expand_ranges`, `A1:B3` contributes every covered cell, as long as the
/// range holds at most `max_range_cells`; larger ranges contribute their corners.
pub fn collect_precedents(
    formula: &str,
    expand_ranges: bool,
    max_range_cells: usize,
) -> Vec<CellAddress> {
    let found = tokens(formula);
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    let mut push = |address: CellAddress| {
        if seen.insert(address) {
            out.push(address);
        }
    };

    let mut i = 0;
    while i < found.len() {
        let token = found[i];
        let range_end = found
            .get(i + 1)
            .filter(|next| expand_ranges && next.start == token.end + 1)
            .filter(|_| formula.as_bytes().get(token.end) == Some(&b':'));

        match range_end {
            Some(end) => {
                let range = normalized(token.address, end.address);
                if range.cell_count() <= max_range_cells {
                    range.cells().for_each(&mut push);
                } else {
                    push(token.address);
                    push(end.address);
                }
                i += 2;
            }
            None => {
                push(token.address);
                i += 1;
            }
        }
    }

    out
}

/// Corner order inside a formula doesn't matter (`B3:A1` covers A1:B3).
fn normalized(a: CellAddress, b: CellAddress) -> CellRange {
    CellRange::new(
        CellAddress::new(a.column.min(b.column), a.row.min(b.row)),
        CellAddress::new(a.column.max(b.column), a.row.max(b.row)),
    )
}

/// Whether the formula references `target` as a whole token (`A1` never
/// matches inside `A10` or `AA1`).
pub fn references_cell(formula: &str, target: &CellAddress) -> bool {
    tokens(formula).iter().any(|t| t.address == *target)
}
