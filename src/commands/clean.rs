//! Clean Command
//!
//! Loads every CSV snapshot in the input directory, cleans each series,
//! merges the survivors and writes one dataset.

use crate::error::{AppError, Result};
use crate::models::PipelineConfig;
use crate::services::pipeline::{
    run_pipeline, run_pipeline_concurrent, write_output, FileOutcome, PipelineResult, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{info, warn};

/// Statistics for a clean run
#[derive(Debug, Default)]
pub struct CleanStats {
    pub files_cleaned: usize,
    pub files_skipped: usize,
    pub rows_written: usize,
    pub duplicates_removed: usize,
    pub invalid_removed: usize,
    pub dropped_columns: Vec<String>,
    pub errors: Vec<String>,
}

impl CleanStats {
    pub fn from_result(result: &PipelineResult) -> Self {
        let mut stats = Self {
            rows_written: result.merged.len(),
            dropped_columns: result.merge_report.dropped_columns.clone(),
            ..Self::default()
        };

        for outcome in &result.outcomes {
            match outcome {
                FileOutcome::Cleaned { clean, .. } => {
                    stats.files_cleaned += 1;
                    stats.duplicates_removed += clean.duplicates_removed;
                    stats.invalid_removed += clean.invalid_removed;
                }
                FileOutcome::Skipped { file, reason } => {
                    stats.files_skipped += 1;
                    stats.errors.push(format!("{}: {}", file, reason));
                }
            }
        }

        stats
    }

    pub fn print_summary(&self) {
        println!("\n📊 Clean Summary:");
        println!("  ✅ Files cleaned: {}", self.files_cleaned);
        println!("  ✅ Rows written: {}", self.rows_written);
        println!("  🧹 Duplicates removed: {}", self.duplicates_removed);
        println!("  🧹 Invalid rows removed: {}", self.invalid_removed);

        if !self.dropped_columns.is_empty() {
            println!("  ⚠️  Columns not shared by every series: {}", self.dropped_columns.join(", "));
        }

        if !self.errors.is_empty() {
            println!("  ⏭️  Files skipped: {}", self.files_skipped);
            for error in &self.errors[0..std::cmp::min(5, self.errors.len())] {
                println!("    ❌ {}", error);
            }
            if self.errors.len() > 5 {
                println!("    ... and {} more", self.errors.len() - 5);
            }
        }
    }
}

fn print_outcome(outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Cleaned { file, rows, clean, .. } => {
            println!(
                "✅ {} - {} rows ({} duplicates, {} invalid removed)",
                file, rows, clean.duplicates_removed, clean.invalid_removed
            );
        }
        FileOutcome::Skipped { file, reason } => {
            println!("⏭️  {} - {}", file, reason);
        }
    }
}

fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Run the clean command
pub fn run(config: PipelineConfig, verbose: bool) -> Result<()> {
    let start_time = Instant::now();
    config.validate()?;

    if verbose {
        println!("🔧 Starting clean...");
        println!("  Input: {}", config.input_dir.display());
        println!("  Output: {}", config.output_file.display());
        match config.window_size {
            Some(window) => println!("  Rolling window: {}", window),
            None => println!("  Rolling window: off"),
        }
        println!("  Jobs: {}", config.jobs);
        println!();
    }

    let total = crate::services::discover_input_files(&config.input_dir)?.len() as u64;
    let pb = progress_bar(total);

    let bar = pb.clone();
    let callback: ProgressCallback = Box::new(move |outcome| {
        if verbose {
            bar.suspend(|| print_outcome(outcome));
        }
        bar.inc(1);
    });

    let result = if config.jobs > 1 {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| AppError::Other(format!("Failed to create tokio runtime: {}", e)))?;
        runtime.block_on(run_pipeline_concurrent(&config, Some(&callback)))?
    } else {
        run_pipeline(&config, Some(&callback))?
    };
    pb.finish_and_clear();

    if !verbose {
        for outcome in result.outcomes.iter().filter(|o| !o.is_cleaned()) {
            print_outcome(outcome);
        }
    }

    let written = write_output(&result, &config, start_time)?;

    let stats = CleanStats::from_result(&result);
    stats.print_summary();
    println!("  💾 Output: {} ({} bytes)", written.output_file.display(), written.bytes_written);
    println!("  ⏱️  Total time: {:.2}s", written.duration.as_secs_f64());

    if stats.errors.is_empty() {
        info!("Clean completed successfully");
    } else {
        warn!("Clean completed with {} skipped files", stats.errors.len());
    }

    Ok(())
}
