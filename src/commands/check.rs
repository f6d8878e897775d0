//! Check Command
//!
//! Dry run: loads and cleans every snapshot and reports what a clean run
//! would do, without writing anything.

use crate::error::Result;
use crate::models::PipelineConfig;
use crate::services::pipeline::{run_pipeline, FileOutcome, PipelineResult};
use serde::Serialize;
use tracing::info;

/// Machine-readable check result
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub input: String,
    pub files: Vec<FileOutcome>,
    pub merged_columns: Vec<String>,
    pub merged_rows: usize,
    pub dropped_columns: Vec<String>,
}

impl CheckReport {
    pub fn from_result(config: &PipelineConfig, result: PipelineResult) -> Self {
        let mut merged_columns = result.merged.columns;
        merged_columns.extend(result.merged.tag_columns);

        Self {
            input: config.input_dir.display().to_string(),
            files: result.outcomes,
            merged_columns,
            merged_rows: result.merged.records.len(),
            dropped_columns: result.merge_report.dropped_columns,
        }
    }

    fn print(&self) {
        println!("🔍 Checking {}", self.input);

        for outcome in &self.files {
            match outcome {
                FileOutcome::Cleaned {
                    file,
                    schema,
                    series_keys,
                    rows,
                    load,
                    clean,
                } => {
                    println!("✅ {} [{}] {}", file, schema, series_keys.join(", "));
                    println!(
                        "    rows: {} read, {} unparseable, {} duplicates, {} zeros, {} filled, {} invalid -> {}",
                        load.rows_read,
                        load.rows_dropped,
                        clean.duplicates_removed,
                        clean.zeros_replaced,
                        clean.values_filled,
                        clean.invalid_removed,
                        rows
                    );
                    if !load.ignored_columns.is_empty() {
                        println!("    ignored columns: {}", load.ignored_columns.join(", "));
                    }
                }
                FileOutcome::Skipped { file, reason } => {
                    println!("❌ {} - {}", file, reason);
                }
            }
        }

        println!("\n📊 Merge Preview:");
        println!("  Rows: {}", self.merged_rows);
        println!("  Columns: {}", self.merged_columns.join(", "));
        if !self.dropped_columns.is_empty() {
            println!("  ⚠️  Dropped: {}", self.dropped_columns.join(", "));
        }
    }
}

/// Run the check command
pub fn run(config: PipelineConfig, json: bool) -> Result<()> {
    let result = run_pipeline(&config, None)?;
    let report = CheckReport::from_result(&config, result);

    info!(
        files = report.files.len(),
        rows = report.merged_rows,
        "Check completed"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }

    Ok(())
}
