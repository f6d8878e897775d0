use crate::constants::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_FILE};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// When min-max rescaling runs relative to feature derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStage {
    /// Returns and volatility computed on raw prices, then prices rescaled
    AfterFeatures,
    /// Prices rescaled first, returns computed on the rescaled values
    BeforeFeatures,
}

impl Default for ScaleStage {
    fn default() -> Self {
        ScaleStage::AfterFeatures
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory of per-series CSV files, or a single CSV file
    pub input_dir: PathBuf,

    /// Destination of the merged CSV
    pub output_file: PathBuf,

    /// Trailing window for rolling features; `None` disables them
    pub window_size: Option<usize>,

    /// Treat `0` in sentinel columns (funding `rate`) as missing
    pub zero_as_missing: bool,

    /// Rescale before or after deriving return/volatility features
    pub scale_stage: ScaleStage,

    /// Also rescale derived feature columns
    pub scale_derived: bool,

    /// Number of files cleaned concurrently
    pub jobs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            window_size: None,
            zero_as_missing: true,
            scale_stage: ScaleStage::AfterFeatures,
            scale_derived: false,
            jobs: 1,
        }
    }
}

impl PipelineConfig {
    /// Create a config for the given paths with default cleaning options
    pub fn new(input_dir: PathBuf, output_file: PathBuf) -> Self {
        Self {
            input_dir,
            output_file,
            ..Self::default()
        }
    }

    /// Reject option combinations the cleaner cannot honor
    pub fn validate(&self) -> Result<()> {
        if let Some(window) = self.window_size {
            if window < 2 {
                return Err(AppError::Config(format!(
                    "window_size must be at least 2, got {}",
                    window
                )));
            }
        }

        if self.jobs == 0 {
            return Err(AppError::Config("jobs must be greater than 0".to_string()));
        }

        Ok(())
    }
}
