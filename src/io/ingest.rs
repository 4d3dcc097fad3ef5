//! CSV ingest and normalization.
//!
//! This module turns a heterogeneous effect-size CSV into clean
//! `Observation`s plus per-row condition values that are safe to group and
//! fit.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2);
//!   there is no meaningful partial result without the schema
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no fitting logic here

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::Observation;
use crate::error::AppError;

pub const COL_AGE: &str = "assigned.age";
pub const COL_EFFECT: &str = "rep.effect";
pub const COL_SE: &str = "SE";
pub const COL_CASE_N: &str = "autism.N";
pub const COL_TOTAL_N: &str = "total.N";
pub const COL_EFFECT_TYPE: &str = "AorR";
pub const COL_MERGE_FIGURE: &str = "merge.figure";

/// Columns every input must carry, beyond the requested condition columns.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_AGE,
    COL_EFFECT,
    COL_SE,
    COL_CASE_N,
    COL_TOTAL_N,
    COL_EFFECT_TYPE,
    COL_MERGE_FIGURE,
];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized observations + aligned condition values.
///
/// `condition_values[col][i]` is row `i`'s value of condition column `col`
/// (missing entries are excluded from grouping later).
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub observations: Vec<Observation>,
    pub condition_values: BTreeMap<String, Vec<Option<String>>>,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

/// Load and normalize a CSV file.
pub fn load_observations(path: &Path, conditions: &[String]) -> Result<IngestedData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    load_observations_from_reader(file, conditions)
}

/// Load and normalize CSV content from any reader.
pub fn load_observations_from_reader<R: Read>(
    reader: R,
    conditions: &[String],
) -> Result<IngestedData, AppError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV header: {e}")))?
        .clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let mut missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| column(name).is_none())
        .collect();
    let missing_conditions: Vec<&str> = conditions
        .iter()
        .map(String::as_str)
        .filter(|name| column(name).is_none())
        .collect();
    missing.extend(&missing_conditions);
    if !missing.is_empty() {
        return Err(AppError::new(
            2,
            format!("Missing required columns: {}", missing.join(", ")),
        ));
    }

    let idx_age = column(COL_AGE).unwrap_or_default();
    let idx_effect = column(COL_EFFECT).unwrap_or_default();
    let idx_se = column(COL_SE).unwrap_or_default();
    let idx_case_n = column(COL_CASE_N).unwrap_or_default();
    let idx_total_n = column(COL_TOTAL_N).unwrap_or_default();
    let idx_effect_type = column(COL_EFFECT_TYPE).unwrap_or_default();
    let idx_merge_figure = column(COL_MERGE_FIGURE).unwrap_or_default();
    let condition_idx: Vec<(String, usize)> = conditions
        .iter()
        .map(|name| (name.clone(), column(name).unwrap_or_default()))
        .collect();

    let mut observations = Vec::new();
    let mut condition_columns: Vec<Vec<Option<String>>> =
        vec![Vec::new(); condition_idx.len()];
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (i, record) in rdr.records().enumerate() {
        // Header is line 1; data starts at line 2.
        let line = i + 2;
        rows_read += 1;

        let record = match record {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("unreadable row: {e}"),
                });
                continue;
            }
        };

        let age = match required_number(&record, idx_age, COL_AGE) {
            Ok(v) => v,
            Err(message) => {
                row_errors.push(RowError { line, message });
                continue;
            }
        };
        let effect = match required_number(&record, idx_effect, COL_EFFECT) {
            Ok(v) => v,
            Err(message) => {
                row_errors.push(RowError { line, message });
                continue;
            }
        };

        observations.push(Observation {
            age,
            effect,
            std_err: optional_number(&record, idx_se),
            case_n: optional_number(&record, idx_case_n),
            total_n: optional_number(&record, idx_total_n),
            effect_label: field(&record, idx_effect_type).to_string(),
            merge_figure: optional_text(&record, idx_merge_figure),
        });
        for (values, (_, idx)) in condition_columns.iter_mut().zip(condition_idx.iter()) {
            values.push(optional_text(&record, *idx));
        }
    }

    let condition_values: BTreeMap<String, Vec<Option<String>>> = condition_idx
        .iter()
        .map(|(name, _)| name.clone())
        .zip(condition_columns)
        .collect();

    Ok(IngestedData {
        observations,
        condition_values,
        rows_read,
        row_errors,
    })
}

/// Read just the header row of a CSV file.
pub fn read_header(path: &Path) -> Result<Vec<String>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = rdr
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV header: {e}")))?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

fn field<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("").trim()
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("na")
}

fn optional_text(record: &StringRecord, idx: usize) -> Option<String> {
    let raw = field(record, idx);
    if is_missing(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn optional_number(record: &StringRecord, idx: usize) -> Option<f64> {
    let raw = field(record, idx);
    if is_missing(raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn required_number(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = field(record, idx);
    if is_missing(raw) {
        return Err(format!("missing {name}"));
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{name} is not a number: '{raw}'")),
    }
}
