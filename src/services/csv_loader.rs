//! CSV Loading Service
//!
//! Reads one raw snapshot file into a [`SeriesTable`]. The header decides the
//! schema; every data row must carry a parseable timestamp, otherwise the
//! whole file is rejected. Rows with unparseable numeric cells are dropped
//! unless they make up most of the file.

use crate::constants::{column, yfinance, EPOCH_MILLIS_THRESHOLD, MAX_BAD_ROW_RATIO, MISSING_MARKERS};
use crate::error::{AppError, Result};
use crate::models::{SeriesRecord, SeriesSchema, SeriesTable};
use crate::utils::series_key_from_file_name;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::io::Read;
use std::iter::Peekable;
use std::path::Path;
use tracing::{debug, warn};

/// Naive datetime layouts accepted in timestamp columns
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Offset-carrying layouts not covered by RFC 3339
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Statistics from reading one file
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub ignored_columns: Vec<String>,
}

/// Parse a timestamp cell
///
/// Accepts RFC 3339, common naive datetime layouts (read as UTC), plain
/// and compact (`20240101`) dates, and integer epochs (seconds, or
/// milliseconds for large values).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    if let Some(date) = compact_date(value) {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    if let Ok(epoch) = value.parse::<i64>() {
        return if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
    }

    None
}

/// `YYYYMMDD`; any other eight-digit value is left to the epoch parser
fn compact_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a numeric cell
///
/// `Ok(None)` for missing-value markers, `Err` for anything unparseable.
pub fn parse_numeric(value: &str) -> std::result::Result<Option<f64>, String> {
    let value = value.trim();
    let lowered = value.to_lowercase();
    if MISSING_MARKERS.contains(&lowered.as_str()) {
        return Ok(None);
    }

    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(v) => Err(format!("non-finite value {}", v)),
        Err(e) => Err(format!("'{}': {}", value, e)),
    }
}

/// Lowercased first cell of the next row, without consuming it
fn leading_cell<I>(rows: &mut Peekable<I>) -> Option<String>
where
    I: Iterator<Item = csv::Result<csv::StringRecord>>,
{
    match rows.peek() {
        Some(Ok(record)) => record.get(0).map(|c| c.to_lowercase()),
        _ => None,
    }
}

/// Load a snapshot file from disk
pub fn load_series_file(path: &Path) -> Result<(SeriesTable, LoadReport)> {
    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid file name: {}", path.display())))?
        .to_string();

    let file = std::fs::File::open(path)
        .map_err(|e| AppError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    load_series(&source, file)
}

/// Load a snapshot from any reader; `source` is the file name used for the
/// series key and in error messages
pub fn load_series<R: Read>(source: &str, reader: R) -> Result<(SeriesTable, LoadReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true) // Allow ragged rows, missing trailing cells are treated as gaps
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Parse(format!("{}: failed to read header: {}", source, e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::EmptySeries(format!("{}: no header row", source)));
    }

    let mut rows = reader.records().peekable();

    // yfinance files: the first header cell is a label, the field names
    // follow, and the bars start after the Ticker/Date rows
    let is_yfinance = headers
        .first()
        .is_some_and(|h| h.eq_ignore_ascii_case(yfinance::PRICE_HEADER))
        && leading_cell(&mut rows).as_deref() == Some(yfinance::TICKER_ROW);
    if is_yfinance {
        while leading_cell(&mut rows).is_some_and(|c| yfinance::META_ROWS.contains(&c.as_str())) {
            rows.next();
        }
        headers[0] = column::DATE.to_string();
        debug!(file = source, "Reading yfinance layout, volume ignored");
    }

    let detect_headers: Vec<String> = headers
        .iter()
        .filter(|h| !(is_yfinance && h.eq_ignore_ascii_case(column::VOLUME)))
        .cloned()
        .collect();

    let schema = SeriesSchema::detect(&detect_headers).map_err(|e| match e {
        AppError::UnknownSchema(msg) => AppError::UnknownSchema(format!("{}: {}", source, msg)),
        other => other,
    })?;

    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let position = |name: &str| lowered.iter().position(|h| h == &name.to_lowercase());

    let time_idx = position(&schema.time_col)
        .ok_or_else(|| AppError::Parse(format!("{}: timestamp column vanished", source)))?;
    let key_idx = schema.key_col.as_deref().and_then(|k| position(k));
    let numeric_idx: Vec<usize> = schema
        .numeric_cols
        .iter()
        .map(|c| {
            position(c).ok_or_else(|| AppError::Parse(format!("{}: missing column {}", source, c)))
        })
        .collect::<Result<_>>()?;

    let mut report = LoadReport::default();
    for (i, header) in headers.iter().enumerate() {
        if i != time_idx && Some(i) != key_idx && !numeric_idx.contains(&i) {
            report.ignored_columns.push(header.clone());
        }
    }
    if !report.ignored_columns.is_empty() {
        debug!(file = source, columns = ?report.ignored_columns, "Ignoring columns outside schema");
    }

    let series_key = series_key_from_file_name(source);
    let mut table = SeriesTable::new(source.to_string(), series_key.clone(), schema);

    for result in rows {
        let record = result.map_err(|e| AppError::Parse(format!("{}: {}", source, e)))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        // Blank lines come through as a single empty field
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        report.rows_read += 1;

        let time_str = record.get(time_idx).unwrap_or("");
        let time = parse_timestamp(time_str).ok_or_else(|| {
            AppError::Parse(format!(
                "{}: unparseable timestamp '{}' on line {}",
                source, time_str, line
            ))
        })?;

        let key = key_idx
            .and_then(|i| record.get(i))
            .filter(|k| !k.is_empty())
            .map(|k| k.to_string())
            .unwrap_or_else(|| series_key.clone());

        let mut values = Vec::with_capacity(numeric_idx.len());
        let mut bad_cell = None;
        for (col, &idx) in table.schema.numeric_cols.iter().zip(&numeric_idx) {
            match parse_numeric(record.get(idx).unwrap_or("")) {
                Ok(v) => values.push(v),
                Err(e) => {
                    bad_cell = Some(format!("{}: {}", col, e));
                    break;
                }
            }
        }

        if let Some(reason) = bad_cell {
            warn!(file = source, line, reason = %reason, "Dropping row with unparseable value");
            report.rows_dropped += 1;
            continue;
        }

        table.records.push(SeriesRecord::new(time, key, values));
    }

    if report.rows_read == 0 {
        return Err(AppError::EmptySeries(format!("{}: no data rows", source)));
    }

    if report.rows_dropped as f64 > report.rows_read as f64 * MAX_BAD_ROW_RATIO {
        return Err(AppError::Parse(format!(
            "{}: {} of {} rows have unparseable values",
            source, report.rows_dropped, report.rows_read
        )));
    }

    Ok((table, report))
}
