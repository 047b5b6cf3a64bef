//! Calculation error catalog and explainer.
//!
//! Error numbers follow the LibreOffice Calc engine. A cell in an error state is
//! normal content, so detection reports it as data rather than failing.

use tracing::{debug, warn};

use crate::bridge::{Bridge, CellHandle};
use crate::core::address::{parse_address, parse_range, CellAddress, CellRange};
use crate::core::reader::CellReader;
use crate::core::references::collect_precedents;
use crate::error::{SheetError, SheetResult};
use crate::types::{
    CellValue, ContentType, DetectedError, ErrorDescriptor, ErrorExplanation, ExplainedError,
    PrecedentDetail,
};

pub const ERR_INVALID_ARGUMENT: u32 = 502;
pub const ERR_VALUE: u32 = 519;
pub const ERR_CIRCULAR: u32 = 522;
pub const ERR_REF: u32 = 524;
pub const ERR_NAME: u32 = 525;
pub const ERR_DIV_ZERO: u32 = 532;
pub const ERR_NA: u32 = 32767;

struct CatalogEntry {
    number: u32,
    /// Display token; `None` means the engine shows `Err:<number>`.
    token: Option<&'static str>,
    name: &'static str,
    description: &'static str,
}

const fn entry(
    number: u32,
    token: Option<&'static str>,
    name: &'static str,
    description: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        number,
        token,
        name,
        description,
    }
}

const CATALOG: &[CatalogEntry] = &[
    entry(501, None, "Invalid character", "A character in the formula is not valid here."),
    entry(
        502,
        None,
        "Invalid argument",
        "A function argument is outside its allowed domain, e.g. SQRT(-1).",
    ),
    entry(503, Some("#NUM!"), "Invalid numeric value", "The calculation over- or underflows."),
    entry(504, None, "Parameter list error", "A function parameter is not of the expected type."),
    entry(507, None, "Missing pair", "A bracket or quote is missing its counterpart."),
    entry(508, None, "Missing bracket", "A closing bracket is missing."),
    entry(509, None, "Missing operator", "An operator is missing between two operands."),
    entry(510, None, "Missing variable", "An operand is missing, e.g. =1+*2."),
    entry(511, None, "Missing variable", "A function needs more arguments than given."),
    entry(512, None, "Formula overflow", "The formula has too many internal tokens."),
    entry(513, None, "String overflow", "A text result is longer than the allowed maximum."),
    entry(514, None, "Internal overflow", "Sorting or processing exceeded an internal limit."),
    entry(516, None, "Internal syntax error", "A matrix was expected on the calculation stack."),
    entry(517, None, "Internal syntax error", "Unknown code encountered during calculation."),
    entry(518, None, "Internal syntax error", "A variable is not available."),
    entry(
        519,
        Some("#VALUE!"),
        "Wrong data type",
        "An argument has the wrong type, e.g. text where a number is expected.",
    ),
    entry(520, None, "Internal syntax error", "The compiler found an unknown code."),
    entry(521, Some("#NULL!"), "No result", "The intersection of two ranges is empty."),
    entry(
        522,
        None,
        "Circular reference",
        "The formula refers directly or indirectly to its own cell.",
    ),
    entry(523, None, "No convergence", "An iterative calculation did not converge."),
    entry(
        524,
        Some("#REF!"),
        "Invalid reference",
        "The formula refers to a cell, range or sheet that does not exist.",
    ),
    entry(
        525,
        Some("#NAME?"),
        "Invalid name",
        "An identifier is neither a known function nor a defined name.",
    ),
    entry(526, None, "Internal syntax error", "The parser could not complete the formula."),
    entry(527, None, "Internal overflow", "References are nested too deeply."),
    entry(532, Some("#DIV/0!"), "Division by zero", "A divisor evaluates to zero or is empty."),
    entry(533, None, "Nested arrays", "Array formulas cannot be nested inside each other."),
    entry(538, None, "Matrix size", "The result array exceeds the supported size."),
    entry(539, None, "Inline array", "Unsupported content inside an inline array."),
    entry(540, None, "External content disabled", "A link to external data is blocked."),
    entry(
        32767,
        Some("#N/A"),
        "Value not available",
        "A lookup found no match, or a required value is missing.",
    ),
];

impl CatalogEntry {
    fn display_token(&self) -> String {
        match self.token {
            Some(token) => token.to_string(),
            None => format!("Err:{}", self.number),
        }
    }

    fn descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            code: self.display_token(),
            number: self.number,
            name: self.name.to_string(),
            description: self.description.to_string(),
        }
    }
}

/// Descriptor for an engine error number. Unknown numbers get a generic entry.
pub fn describe_code(number: u32) -> ErrorDescriptor {
    match CATALOG.iter().find(|e| e.number == number) {
        Some(entry) => entry.descriptor(),
        None => ErrorDescriptor {
            code: format!("Err:{}", number),
            number,
            name: "Unknown error".to_string(),
            description: format!("Unrecognized calculation error code {}", number),
        },
    }
}

/// Engine error number for a displayed error value such as `#DIV/0!` or
/// `Err:502`, found anywhere in `text`.
pub fn lookup_token(text: &str) -> Option<u32> {
    let upper = text.to_ascii_uppercase();
    CATALOG
        .iter()
        .map(|e| (e.number, e.display_token().to_ascii_uppercase()))
        .filter(|(_, token)| contains_token(&upper, token))
        .max_by_key(|(_, token)| token.len())
        .map(|(number, _)| number)
}

/// A match followed by a digit is part of a longer number: `Err:5220` holds no `Err:522`.
fn contains_token(text: &str, token: &str) -> bool {
    text.match_indices(token).any(|(start, _)| {
        !text[start + token.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Descriptor for a displayed error value; used when no error number is at hand.
pub fn describe_text(text: &str) -> ErrorDescriptor {
    match lookup_token(text) {
        Some(number) => describe_code(number),
        None => ErrorDescriptor {
            code: text.trim().to_string(),
            number: 0,
            name: "Unknown error".to_string(),
            description: format!("Unrecognized error value '{}'", text.trim()),
        },
    }
}

/// `None` scans the used area. An explicit range is clipped to it, since cells
/// outside hold no formulas.
fn scan_region<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: &str,
    requested: Option<CellRange>,
) -> SheetResult<Option<CellRange>> {
    let used = reader.used_area(sheet)?;
    Ok(match (requested, used) {
        (_, None) => None,
        (None, Some(used)) => Some(used),
        (Some(requested), Some(used)) => requested.intersect(&used),
    })
}

fn detect_in<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: &str,
    range: Option<CellRange>,
) -> SheetResult<Vec<DetectedError>> {
    let Some(region) = scan_region(reader, sheet, range)? else {
        return Ok(Vec::new());
    };

    let mut found = Vec::new();
    for address in region.cells() {
        let cell = reader.handle(sheet, address)?;
        if cell.content_type() != ContentType::Formula {
            continue;
        }
        let code = cell.error_code();
        if code != 0 {
            found.push(DetectedError {
                address,
                formula: cell.formula_text(),
                error: describe_code(code),
            });
        }
    }

    debug!(sheet, region = %region, errors = found.len(), "error scan");
    Ok(found)
}

/// Formula cells in an error state, row-major over `range` or the used area.
pub fn detect_errors<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    range: Option<&str>,
) -> SheetResult<Vec<DetectedError>> {
    let range = range.map(parse_range).transpose()?;
    let sheet = reader.resolve_sheet(sheet)?;
    detect_in(reader, &sheet, range)
}

fn explain_at<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: &str,
    address: CellAddress,
) -> SheetResult<ErrorExplanation> {
    let cell = reader.handle(sheet, address)?;
    let code = cell.error_code();
    let error = if code != 0 {
        describe_code(code)
    } else {
        // No number exposed: fall back to the displayed result of a formula.
        let token = match cell.content_type() {
            ContentType::Formula => lookup_token(&cell.string_value()),
            _ => None,
        };
        match token {
            Some(number) => describe_code(number),
            None => return Err(SheetError::NotAnError(address.to_string())),
        }
    };
    let formula = cell.formula_text();

    let config = reader.config();
    let precedents = collect_precedents(&formula, config.expand_ranges, config.max_cells)
        .into_iter()
        .map(|precedent| match reader.read_at(sheet, precedent) {
            Ok(snapshot) => PrecedentDetail::Read(snapshot),
            Err(e) => {
                warn!(cell = %address, precedent = %precedent, error = %e, "unreadable precedent");
                PrecedentDetail::Unreadable {
                    address: precedent.to_string(),
                    value: "unreadable".to_string(),
                }
            }
        })
        .collect::<Vec<_>>();

    let suggestion = suggest(&error, &formula, &precedents);
    Ok(ErrorExplanation {
        address,
        formula,
        error,
        precedents,
        suggestion,
    })
}

/// Describe the error in one cell, its precedents and a suggested fix.
/// Precedents that cannot be read are reported as placeholders.
pub fn explain_error<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    address: &str,
) -> SheetResult<ErrorExplanation> {
    let address = parse_address(address)?;
    let sheet = reader.resolve_sheet(sheet)?;
    explain_at(reader, &sheet, address)
}

/// Detection plus an explanation per hit. A cell that cannot be explained keeps
/// its bare detection entry.
pub fn detect_and_explain<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    range: Option<&str>,
) -> SheetResult<Vec<ExplainedError>> {
    let range = range.map(parse_range).transpose()?;
    let sheet = reader.resolve_sheet(sheet)?;
    let detected = detect_in(reader, &sheet, range)?;

    Ok(detected
        .into_iter()
        .map(|hit| match explain_at(reader, &sheet, hit.address) {
            Ok(explanation) => ExplainedError::Explained(explanation),
            Err(e) => {
                warn!(cell = %hit.address, error = %e, "explanation failed");
                ExplainedError::Bare {
                    detected: hit,
                    explanation_error: e.to_string(),
                }
            }
        })
        .collect())
}

fn is_zero_or_empty(value: &CellValue) -> bool {
    match value {
        CellValue::Empty => true,
        CellValue::Number(n) => *n == 0.0,
        CellValue::Text(text) => {
            let text = text.trim();
            text.is_empty() || text.parse::<f64>().map(|n| n == 0.0).unwrap_or(false)
        }
    }
}

fn is_text(value: &CellValue) -> bool {
    match value {
        CellValue::Text(text) => {
            let text = text.trim();
            !text.is_empty() && text.parse::<f64>().is_err()
        }
        _ => false,
    }
}

fn matching(precedents: &[PrecedentDetail], test: fn(&CellValue) -> bool) -> Vec<String> {
    precedents
        .iter()
        .filter_map(PrecedentDetail::snapshot)
        .filter(|s| test(&s.value))
        .map(|s| s.address.to_string())
        .collect()
}

fn body(formula: &str) -> &str {
    formula.strip_prefix('=').unwrap_or(formula)
}

fn suggest(error: &ErrorDescriptor, formula: &str, precedents: &[PrecedentDetail]) -> String {
    match error.number {
        ERR_DIV_ZERO => {
            let zeros = matching(precedents, is_zero_or_empty);
            match zeros.first() {
                Some(divisor) => format!(
                    "{} zero or empty. Fill in the divisor or guard the division: \
                     =IF({}=0;\"\";{})",
                    if zeros.len() == 1 {
                        format!("{} is", zeros[0])
                    } else {
                        format!("{} are", zeros.join(", "))
                    },
                    divisor,
                    body(formula)
                ),
                None => format!(
                    "A divisor evaluates to zero. Guard the division with \
                     =IFERROR({};\"\") or check the divisor's inputs.",
                    body(formula)
                ),
            }
        }
        ERR_REF => "The formula points at a cell or sheet that no longer exists. Check for \
                    deleted rows, columns or sheets and re-enter the reference."
            .to_string(),
        ERR_NAME => format!(
            "Check the spelling of function names and named ranges in {}. Text \
             constants must be quoted.",
            formula
        ),
        ERR_VALUE | ERR_INVALID_ARGUMENT => {
            let texts = matching(precedents, is_text);
            if texts.is_empty() {
                "An argument has the wrong type or is out of range. Check the value each \
                 referenced cell holds."
                    .to_string()
            } else {
                format!(
                    "{} {} text where a number is expected. Convert with VALUE() or fix \
                     the source data.",
                    texts.join(", "),
                    if texts.len() == 1 { "contains" } else { "contain" }
                )
            }
        }
        ERR_NA => format!(
            "The lookup found no match. Check that the value exists in the search \
             range, or trap it: =IFERROR({};\"not found\")",
            body(formula)
        ),
        ERR_CIRCULAR => {
            let cells: Vec<String> = precedents
                .iter()
                .map(|p| match p {
                    PrecedentDetail::Read(s) => s.address.to_string(),
                    PrecedentDetail::Unreadable { address, .. } => address.clone(),
                })
                .collect();
            format!(
                "The formula depends on its own result through {}. Move one step of the \
                 calculation into a separate cell to break the loop.",
                if cells.is_empty() {
                    "itself".to_string()
                } else {
                    cells.join(", ")
                }
            )
        }
        _ => error.description.clone(),
    }
}
