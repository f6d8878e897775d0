use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::models::{PipelineConfig, ScaleStage};
use crate::utils::{get_input_dir, get_output_file};

#[derive(Parser)]
#[command(name = "marketprep")]
#[command(about = "Clean, normalize and merge market data CSV snapshots", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean every snapshot and write the merged dataset
    Clean {
        #[command(flatten)]
        options: CleanOptions,

        /// Output CSV (default: $MARKETPREP_OUTPUT_FILE or data/processed/merged.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of files to clean concurrently
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,
    },
    /// Report what a clean run would do without writing anything
    Check {
        #[command(flatten)]
        options: CleanOptions,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by `clean` and `check`
#[derive(Args)]
pub struct CleanOptions {
    /// Input directory or single CSV file (default: $MARKETPREP_INPUT_DIR or data/raw)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Rolling window size for rolling mean/volatility features
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Keep zeros in sentinel columns instead of treating them as missing
    #[arg(long)]
    pub keep_zeros: bool,

    /// Scale raw columns before computing derived features
    #[arg(long)]
    pub scale_before_features: bool,

    /// Also scale derived feature columns
    #[arg(long)]
    pub scale_derived: bool,
}

impl CleanOptions {
    fn into_config(self, output: Option<PathBuf>, jobs: usize) -> PipelineConfig {
        let mut config = PipelineConfig::new(
            self.input.unwrap_or_else(get_input_dir),
            output.unwrap_or_else(get_output_file),
        );
        config.window_size = self.window;
        config.zero_as_missing = !self.keep_zeros;
        config.scale_stage = if self.scale_before_features {
            ScaleStage::BeforeFeatures
        } else {
            ScaleStage::AfterFeatures
        };
        config.scale_derived = self.scale_derived;
        config.jobs = jobs;
        config
    }
}

pub fn run(cli: Cli) {
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Clean { options, output, jobs } => {
            commands::clean::run(options.into_config(output, jobs), verbose)
        }
        Commands::Check { options, json } => {
            commands::check::run(options.into_config(None, 1), json)
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
