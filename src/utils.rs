use std::path::{Path, PathBuf};

use crate::constants::{
    CSV_EXTENSION, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_FILE, SERIES_KEY_PREFIXES, SERIES_KEY_SUFFIXES,
};

pub mod deduplication;

/// Get raw input directory from environment variable or use default
pub fn get_input_dir() -> PathBuf {
    std::env::var("MARKETPREP_INPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_INPUT_DIR))
}

/// Get merged output path from environment variable or use default
pub fn get_output_file() -> PathBuf {
    std::env::var("MARKETPREP_OUTPUT_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_FILE))
}

/// Whether a path looks like a CSV snapshot
pub fn is_csv_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(CSV_EXTENSION))
            .unwrap_or(false)
}

/// Derive a series key from a snapshot file name
///
/// `df_BTC_USDT_historical_data.csv` -> `BTC_USDT`, `JLP_SOL_90days.csv` -> `JLP_SOL`.
pub fn series_key_from_file_name(file_name: &str) -> String {
    let mut key = file_name;

    if let Some(stem) = key
        .strip_suffix(".csv")
        .or_else(|| key.strip_suffix(".CSV"))
    {
        key = stem;
    }

    for prefix in SERIES_KEY_PREFIXES {
        if let Some(rest) = key.strip_prefix(prefix) {
            key = rest;
        }
    }

    for suffix in SERIES_KEY_SUFFIXES {
        if let Some(rest) = key.strip_suffix(suffix) {
            key = rest;
        }
    }

    key.to_string()
}
