//! Column and File Naming Constants
//!
//! Canonical names used when reading raw snapshots and writing the merged
//! dataset.
//!
//! ## Raw Schemas
//!
//! - **OHLCV**: timestamp, open, high, low, close, volume
//! - **OHLCV + quote**: adds bid, ask
//! - **OHLC** (FX bars): timestamp, open, high, low, close
//! - **Funding rate**: timestamp, pair, rate
//! - **Price** (aggregator snapshots): timestamp, price, market_cap, volume
//!
//! Header matching is case-insensitive.

/// Raw input column names
pub mod column {
    pub const TIMESTAMP: &str = "timestamp";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const PAIR: &str = "pair";
    pub const SOURCE: &str = "source";

    pub const OPEN: &str = "open";
    pub const HIGH: &str = "high";
    pub const LOW: &str = "low";
    pub const CLOSE: &str = "close";
    pub const VOLUME: &str = "volume";
    pub const BID: &str = "bid";
    pub const ASK: &str = "ask";
    pub const RATE: &str = "rate";
    pub const PRICE: &str = "price";
    pub const MARKET_CAP: &str = "market_cap";
}

/// Columns appended by the cleaning pipeline
pub mod derived {
    pub const DAILY_RETURN: &str = "daily_return";
    pub const VOLATILITY: &str = "volatility";
    pub const LOG_RETURN: &str = "log_return";
    pub const SPREAD: &str = "spread";
    pub const RATE_NORM: &str = "rate_norm";
    pub const ROLLING_VOLATILITY: &str = "rolling_volatility";
    pub const ROLLING_MEAN: &str = "rolling_mean";

    /// Text columns split out of a funding pair such as `SOL/USDC:USDC`
    pub const BASE: &str = "base";
    pub const QUOTE: &str = "quote";
}

/// yfinance downloads: a `Price` header over the field names, followed by
/// `Ticker` and `Date` rows before the first bar
pub mod yfinance {
    pub const PRICE_HEADER: &str = "price";
    pub const TICKER_ROW: &str = "ticker";
    pub const META_ROWS: &[&str] = &["ticker", "date"];
}

/// Output column carrying series membership
pub const SERIES_KEY: &str = "series_key";

/// Timestamp format used in the merged output
pub const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Extension of files picked up from an input directory
pub const CSV_EXTENSION: &str = "csv";

/// File-name prefixes stripped when deriving a series key
pub const SERIES_KEY_PREFIXES: &[&str] = &["df_"];

/// File-name suffixes stripped when deriving a series key
pub const SERIES_KEY_SUFFIXES: &[&str] = &["_historical_data", "_90days"];

/// Numeric cell values read as missing
pub const MISSING_MARKERS: &[&str] = &["", "nan", "na", "null", "none", "<na>"];

/// Share of data rows with unparseable numeric cells above which the whole
/// file is rejected instead of dropping those rows
pub const MAX_BAD_ROW_RATIO: f64 = 0.5;

/// Epoch values at or above this are milliseconds, below are seconds
pub const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Default input directory when neither flag nor env var is set
pub const DEFAULT_INPUT_DIR: &str = "data/raw";

/// Default merged output path when neither flag nor env var is set
pub const DEFAULT_OUTPUT_FILE: &str = "data/processed/merged.csv";
