//! Merged CSV output
//!
//! The merged table is written to `<output>.tmp` next to the destination and
//! renamed into place only after a successful flush, so a failed run never
//! leaves a half-written output file behind.

use crate::constants::{OUTPUT_TIME_FORMAT, SERIES_KEY};
use crate::error::{AppError, Result};
use crate::services::series_merger::MergedTable;
use std::path::{Path, PathBuf};

/// Format a cell: missing is empty, non-finite keeps its `NaN`/`inf` spelling
pub fn format_value(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.is_nan() => "NaN".to_string(),
        Some(v) => v.to_string(),
    }
}

/// Header row for a merged table
pub fn header_row(merged: &MergedTable) -> Vec<String> {
    let mut header = vec!["timestamp".to_string(), SERIES_KEY.to_string()];
    header.extend(merged.columns.iter().cloned());
    header.extend(merged.tag_columns.iter().cloned());
    header
}

fn temp_path_for(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    output.with_file_name(name)
}

/// Write the merged table atomically
///
/// Returns the number of bytes written.
pub fn write_merged_csv(merged: &MergedTable, output: &Path) -> Result<u64> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    let temp_path = temp_path_for(output);

    if let Err(e) = write_records(merged, &temp_path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    std::fs::rename(&temp_path, output).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        AppError::Io(format!(
            "Failed to move {} to {}: {}",
            temp_path.display(),
            output.display(),
            e
        ))
    })?;

    let bytes = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    Ok(bytes)
}

fn write_records(merged: &MergedTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::Io(format!("Failed to create {}: {}", path.display(), e)))?;

    writer
        .write_record(header_row(merged))
        .map_err(|e| AppError::Io(format!("Failed to write header to {}: {}", path.display(), e)))?;

    for record in &merged.records {
        let mut row = Vec::with_capacity(2 + record.values.len() + record.tags.len());
        row.push(record.time.format(OUTPUT_TIME_FORMAT).to_string());
        row.push(record.key.clone());
        row.extend(record.values.iter().map(|v| format_value(*v)));
        row.extend(record.tags.iter().cloned());

        writer
            .write_record(&row)
            .map_err(|e| AppError::Io(format!("Failed to write record to {}: {}", path.display(), e)))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::Io(format!("Failed to flush {}: {}", path.display(), e)))?;

    Ok(())
}
