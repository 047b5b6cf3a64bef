//! Numeric aggregation, outliers and duplicates over sheet ranges.

use std::collections::HashMap;

use tracing::debug;

use crate::bridge::{Bridge, CellHandle};
use crate::core::address::{letters_to_column, parse_range, CellAddress, CellRange};
use crate::core::reader::{snapshot_of, CellReader};
use crate::error::{SheetError, SheetResult};
use crate::types::{ContentType, DuplicateEntry, Outlier, OutlierReport, RangeStatistics};

/// Numeric content of a cell, including formula results. A formula showing
/// `0` counts as zero; formulas in an error state and text don't count.
fn numeric_of<C: CellHandle>(cell: &C) -> Option<f64> {
    match cell.content_type() {
        ContentType::Numeric => Some(cell.numeric_value()),
        ContentType::Formula if cell.error_code() == 0 => {
            let n = cell.numeric_value();
            if n != 0.0 {
                Some(n)
            } else {
                cell.string_value().trim().parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

fn clip_to_used<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: &str,
    range: &CellRange,
) -> SheetResult<Option<CellRange>> {
    Ok(reader
        .used_area(sheet)?
        .and_then(|used| range.intersect(&used)))
}

fn numeric_cells<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: &str,
    region: Option<CellRange>,
) -> SheetResult<Vec<(CellAddress, f64)>> {
    let Some(region) = region else {
        return Ok(Vec::new());
    };
    let mut values = Vec::new();
    for address in region.cells() {
        if let Some(n) = numeric_of(&reader.handle(sheet, address)?) {
            values.push((address, n));
        }
    }
    Ok(values)
}

/// Count, sum, mean, extremes and sample standard deviation of `values`.
/// Empty input yields zeros and `None`s.
pub fn summarize(target: impl Into<String>, values: &[f64]) -> RangeStatistics {
    let count = values.len();
    let sum: f64 = values.iter().sum();
    let mean = (count > 0).then(|| sum / count as f64);
    let min = values.iter().copied().reduce(f64::min);
    let max = values.iter().copied().reduce(f64::max);

    RangeStatistics {
        target: target.into(),
        count,
        sum,
        mean,
        min,
        max,
        standard_deviation: sample_std_dev(values, mean),
    }
}

fn sample_std_dev(values: &[f64], mean: Option<f64>) -> f64 {
    match mean {
        Some(mean) if values.len() > 1 => {
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (values.len() - 1) as f64).sqrt()
        }
        _ => 0.0,
    }
}

/// Statistics over one column, across the used rows of the sheet.
pub fn column_statistics<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    column: &str,
) -> SheetResult<RangeStatistics> {
    let letters = column.trim().to_ascii_uppercase();
    let index = letters_to_column(&letters)
        .ok_or_else(|| SheetError::InvalidAddress(column.to_string()))?;
    let sheet = reader.resolve_sheet(sheet)?;

    let region = reader.used_area(&sheet)?.map(|used| {
        CellRange::new(
            CellAddress::new(index, used.start.row),
            CellAddress::new(index, used.end.row),
        )
    });
    let values: Vec<f64> = numeric_cells(reader, &sheet, region)?
        .into_iter()
        .map(|(_, n)| n)
        .collect();

    debug!(sheet = %sheet, column = %letters, samples = values.len(), "column statistics");
    Ok(summarize(letters, &values))
}

/// Statistics over an arbitrary range.
pub fn range_statistics<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    range: &str,
) -> SheetResult<RangeStatistics> {
    let parsed = parse_range(range)?;
    let sheet = reader.resolve_sheet(sheet)?;
    let region = clip_to_used(reader, &sheet, &parsed)?;
    let values: Vec<f64> = numeric_cells(reader, &sheet, region)?
        .into_iter()
        .map(|(_, n)| n)
        .collect();
    Ok(summarize(parsed.to_string(), &values))
}

/// Values whose z-score exceeds the threshold (config default when `None`).
///
/// Below the configured minimum sample count the report is flagged as
/// insufficient and lists nothing. Identical values never produce outliers.
pub fn detect_outliers<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    range: &str,
    z_threshold: Option<f64>,
) -> SheetResult<OutlierReport> {
    let parsed = parse_range(range)?;
    let sheet = reader.resolve_sheet(sheet)?;
    let config = reader.config();
    let threshold = z_threshold.unwrap_or(config.outlier_z_threshold);

    let region = clip_to_used(reader, &sheet, &parsed)?;
    let samples = numeric_cells(reader, &sheet, region)?;
    let values: Vec<f64> = samples.iter().map(|(_, n)| *n).collect();
    let stats = summarize(parsed.to_string(), &values);

    let insufficient_data = samples.len() < config.min_outlier_samples;
    let outliers = match stats.mean {
        Some(mean) if !insufficient_data && stats.standard_deviation > 0.0 => samples
            .iter()
            .filter_map(|&(address, value)| {
                let z_score = (value - mean).abs() / stats.standard_deviation;
                (z_score > threshold).then_some(Outlier {
                    address,
                    value,
                    z_score,
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(OutlierReport {
        target: stats.target,
        sample_count: samples.len(),
        insufficient_data,
        mean: stats.mean,
        standard_deviation: stats.standard_deviation,
        threshold,
        outliers,
    })
}

/// Non-empty values occurring more than once, by display string, most frequent
/// first. Ties keep first-seen order.
pub fn detect_duplicates<B: Bridge>(
    reader: &CellReader<'_, B>,
    sheet: Option<&str>,
    range: &str,
) -> SheetResult<Vec<DuplicateEntry>> {
    let parsed = parse_range(range)?;
    let sheet = reader.resolve_sheet(sheet)?;
    let Some(region) = clip_to_used(reader, &sheet, &parsed)? else {
        return Ok(Vec::new());
    };

    let mut entries: Vec<DuplicateEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for address in region.cells() {
        let value = snapshot_of(&reader.handle(&sheet, address)?, false).value;
        if value.is_empty() {
            continue;
        }
        let key = value.display();
        match index.get(&key) {
            Some(&i) => {
                entries[i].count += 1;
                entries[i].cells.push(address);
            }
            None => {
                index.insert(key.clone(), entries.len());
                entries.push(DuplicateEntry {
                    value: key,
                    count: 1,
                    cells: vec![address],
                });
            }
        }
    }

    entries.retain(|e| e.count > 1);
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(entries)
}
