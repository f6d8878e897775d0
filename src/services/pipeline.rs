//! Batch pipeline: discover files, clean each one, merge, write
//!
//! A file that fails to load or clean is reported and left out of the merge;
//! only a missing input path or an unwritable output aborts the run.

use crate::error::{AppError, Result};
use crate::models::{PipelineConfig, SchemaKind, SeriesTable};
use crate::services::csv_loader::{load_series_file, LoadReport};
use crate::services::csv_writer::write_merged_csv;
use crate::services::series_cleaner::{clean_series, CleanReport};
use crate::services::series_merger::{merge_series, MergeReport, MergedTable};
use crate::utils::is_csv_file;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Progress callback invoked once per processed file
pub type ProgressCallback = Box<dyn Fn(&FileOutcome) + Send + Sync>;

/// Result of processing one input file
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Cleaned {
        file: String,
        schema: SchemaKind,
        series_keys: Vec<String>,
        rows: usize,
        load: LoadReport,
        clean: CleanReport,
    },
    Skipped {
        file: String,
        reason: String,
    },
}

impl FileOutcome {
    pub fn file(&self) -> &str {
        match self {
            FileOutcome::Cleaned { file, .. } | FileOutcome::Skipped { file, .. } => file,
        }
    }

    pub fn is_cleaned(&self) -> bool {
        matches!(self, FileOutcome::Cleaned { .. })
    }
}

/// Everything produced by one run, before writing
#[derive(Debug)]
pub struct PipelineResult {
    pub outcomes: Vec<FileOutcome>,
    pub merged: MergedTable,
    pub merge_report: MergeReport,
}

impl PipelineResult {
    pub fn cleaned_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_cleaned()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.cleaned_count()
    }
}

/// Statistics for a completed run
#[derive(Debug)]
pub struct PipelineStats {
    pub files_cleaned: usize,
    pub files_skipped: usize,
    pub rows_written: usize,
    pub bytes_written: u64,
    pub output_file: PathBuf,
    pub duration: Duration,
}

/// List the CSV files to process
///
/// A file path yields itself; a directory yields its `*.csv` entries sorted
/// by name. A missing path is fatal.
pub fn discover_input_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(AppError::Io(format!(
            "Input path not found: {}",
            input.display()
        )));
    }

    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let entries = std::fs::read_dir(input)
        .map_err(|e| AppError::Io(format!("Failed to read {}: {}", input.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::Io(format!("Failed to read directory entry: {}", e)))?;
        let path = entry.path();
        if is_csv_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Load and clean a single file
pub fn process_file(path: &Path, config: &PipelineConfig) -> Result<(SeriesTable, LoadReport, CleanReport)> {
    let (table, load) = load_series_file(path)?;
    let (table, clean) = clean_series(table, config)?;
    Ok((table, load, clean))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Turn a processing result into an outcome, logging either way
fn record_outcome(
    path: &Path,
    result: Result<(SeriesTable, LoadReport, CleanReport)>,
) -> (Option<SeriesTable>, FileOutcome) {
    let file = file_label(path);

    match result {
        Ok((table, load, clean)) => {
            let series_keys = table.keys();
            info!(file = %file, schema = %table.schema.kind, rows = table.len(), "Cleaned series");
            let outcome = FileOutcome::Cleaned {
                file,
                schema: table.schema.kind,
                series_keys,
                rows: table.len(),
                load,
                clean,
            };
            (Some(table), outcome)
        }
        Err(e) => {
            warn!(file = %file, reason = %e, "Skipping series");
            (None, FileOutcome::Skipped { file, reason: e.to_string() })
        }
    }
}

fn finish(tables: Vec<SeriesTable>, outcomes: Vec<FileOutcome>) -> PipelineResult {
    let (merged, merge_report) = merge_series(&tables);
    debug!(tables = merge_report.tables, rows = merge_report.rows, "Merged series");
    PipelineResult {
        outcomes,
        merged,
        merge_report,
    }
}

/// Clean every input file one after another and merge the results
pub fn run_pipeline(config: &PipelineConfig, progress: Option<&ProgressCallback>) -> Result<PipelineResult> {
    config.validate()?;
    let files = discover_input_files(&config.input_dir)?;
    info!(input = %config.input_dir.display(), files = files.len(), "Starting pipeline");

    let mut tables = Vec::new();
    let mut outcomes = Vec::with_capacity(files.len());

    for path in &files {
        let (table, outcome) = record_outcome(path, process_file(path, config));
        if let Some(callback) = progress {
            callback(&outcome);
        }
        tables.extend(table);
        outcomes.push(outcome);
    }

    Ok(finish(tables, outcomes))
}

/// Clean files concurrently, `config.jobs` at a time, then merge
///
/// Each batch runs on blocking worker threads; the merge waits for every
/// batch. Outcomes keep file order regardless of completion order.
pub async fn run_pipeline_concurrent(
    config: &PipelineConfig,
    progress: Option<&ProgressCallback>,
) -> Result<PipelineResult> {
    config.validate()?;
    let files = discover_input_files(&config.input_dir)?;
    info!(
        input = %config.input_dir.display(),
        files = files.len(),
        jobs = config.jobs,
        "Starting concurrent pipeline"
    );

    let mut tables = Vec::new();
    let mut outcomes = Vec::with_capacity(files.len());

    for batch in files.chunks(config.jobs) {
        let mut tasks = Vec::with_capacity(batch.len());
        for path in batch {
            let path = path.clone();
            let config = config.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                let result = process_file(&path, &config);
                (path, result)
            }));
        }

        let results = futures::future::join_all(tasks).await;

        for (path, task_result) in batch.iter().zip(results) {
            let result = match task_result {
                Ok((_, result)) => result,
                Err(e) => Err(AppError::Other(format!("Worker task failed: {}", e))),
            };
            let (table, outcome) = record_outcome(path, result);
            if let Some(callback) = progress {
                callback(&outcome);
            }
            tables.extend(table);
            outcomes.push(outcome);
        }
    }

    Ok(finish(tables, outcomes))
}

/// Write a finished run to `config.output_file`
pub fn write_output(result: &PipelineResult, config: &PipelineConfig, started: Instant) -> Result<PipelineStats> {
    let bytes_written = write_merged_csv(&result.merged, &config.output_file)?;

    info!(
        output = %config.output_file.display(),
        rows = result.merged.len(),
        bytes = bytes_written,
        "Wrote merged dataset"
    );

    Ok(PipelineStats {
        files_cleaned: result.cleaned_count(),
        files_skipped: result.skipped_count(),
        rows_written: result.merged.len(),
        bytes_written,
        output_file: config.output_file.clone(),
        duration: started.elapsed(),
    })
}
