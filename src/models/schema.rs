//! Series schema descriptors
//!
//! Every raw snapshot is described by a [`SeriesSchema`] detected from its
//! header row. The cleaner is driven entirely by the descriptor, so one
//! routine handles OHLCV bars, quote-level liquidity, funding rates and
//! aggregator price snapshots.

use crate::constants::{column, derived};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Recognized raw snapshot layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// OHLCV bars plus bid/ask quotes
    Quote,
    /// OHLCV bars
    Ohlcv,
    /// OHLC bars without volume (FX rates)
    Ohlc,
    /// Perpetual funding rates
    FundingRate,
    /// Aggregator price snapshots (price, market_cap, volume)
    Price,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Quote => "quote",
            SchemaKind::Ohlcv => "ohlcv",
            SchemaKind::Ohlc => "ohlc",
            SchemaKind::FundingRate => "funding_rate",
            SchemaKind::Price => "price",
        }
    }

    /// Whether rows carry open/high/low/close bars
    pub fn has_ohlc(&self) -> bool {
        matches!(self, SchemaKind::Quote | SchemaKind::Ohlcv | SchemaKind::Ohlc)
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the OHLC bar columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OhlcColumns {
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl Default for OhlcColumns {
    fn default() -> Self {
        Self {
            open: column::OPEN.to_string(),
            high: column::HIGH.to_string(),
            low: column::LOW.to_string(),
            close: column::CLOSE.to_string(),
        }
    }
}

/// Names of the bid/ask quote columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteColumns {
    pub bid: String,
    pub ask: String,
}

impl Default for QuoteColumns {
    fn default() -> Self {
        Self {
            bid: column::BID.to_string(),
            ask: column::ASK.to_string(),
        }
    }
}

/// A min-max rescaling target.
///
/// `source == target` rescales in place; otherwise the scaled values land in
/// a new column and the raw one is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleTarget {
    pub source: String,
    pub target: String,
}

impl ScaleTarget {
    pub fn in_place(name: &str) -> Self {
        Self {
            source: name.to_string(),
            target: name.to_string(),
        }
    }

    pub fn into_new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Descriptor driving `clean_series`
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSchema {
    pub kind: SchemaKind,

    /// Header of the timestamp column as written in the file
    pub time_col: String,

    /// Header of the per-row series key column (`pair` / `source`), if any
    pub key_col: Option<String>,

    /// Canonical (lowercase) numeric columns read from the file, in output order
    pub numeric_cols: Vec<String>,

    /// Present when rows must satisfy OHLC consistency
    pub ohlc_cols: Option<OhlcColumns>,

    /// Present when rows must satisfy `bid <= ask`
    pub quote_cols: Option<QuoteColumns>,

    /// Column that must be non-negative
    pub volume_col: Option<String>,

    /// Columns where `0` means "no data"
    pub zero_sentinel_cols: Vec<String>,

    /// Columns rescaled to [0, 1]
    pub scale_targets: Vec<ScaleTarget>,

    /// Append daily_return / volatility / log_return
    pub derive_returns: bool,

    /// Append `spread = ask - bid`
    pub derive_spread: bool,

    /// Split the key column into `base` / `quote` text columns
    pub split_pair: bool,
}

impl SeriesSchema {
    /// Detect the schema from a header row.
    ///
    /// Headers are compared trimmed and case-insensitively. The richest
    /// matching layout wins: quote > ohlcv > ohlc > funding rate > price.
    pub fn detect(headers: &[String]) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let has = |name: &str| normalized.iter().any(|h| h == name);
        let original = |name: &str| -> Option<String> {
            normalized
                .iter()
                .position(|h| h == name)
                .map(|i| headers[i].trim().to_string())
        };

        let time_col = [column::TIMESTAMP, column::DATE, column::TIME]
            .iter()
            .find_map(|name| original(*name))
            .ok_or_else(|| {
                AppError::UnknownSchema(format!(
                    "no timestamp column in header [{}]",
                    headers.join(", ")
                ))
            })?;

        let key_col = [column::PAIR, column::SOURCE]
            .iter()
            .find_map(|name| original(*name));

        let has_ohlc = has(column::OPEN) && has(column::HIGH) && has(column::LOW) && has(column::CLOSE);
        let has_volume = has(column::VOLUME);
        let has_quote = has(column::BID) && has(column::ASK);

        let kind = if has_ohlc && has_volume && has_quote {
            SchemaKind::Quote
        } else if has_ohlc && has_volume {
            SchemaKind::Ohlcv
        } else if has_ohlc {
            SchemaKind::Ohlc
        } else if has(column::RATE) {
            SchemaKind::FundingRate
        } else if has(column::PRICE) {
            SchemaKind::Price
        } else {
            return Err(AppError::UnknownSchema(format!(
                "header [{}] matches no known layout",
                headers.join(", ")
            )));
        };

        let mut schema = Self::for_kind(kind, time_col);
        schema.key_col = key_col;

        if kind == SchemaKind::Price {
            // market_cap and volume are optional in aggregator snapshots
            let optional: Vec<&str> = [column::MARKET_CAP, column::VOLUME]
                .into_iter()
                .filter(|name| has(*name))
                .collect();
            for name in optional {
                schema.numeric_cols.push(name.to_string());
                schema.scale_targets.push(ScaleTarget::in_place(name));
            }
        }

        if kind == SchemaKind::FundingRate {
            schema.split_pair = schema.key_col.is_some();
        }

        Ok(schema)
    }

    /// Default descriptor for a layout
    pub fn for_kind(kind: SchemaKind, time_col: String) -> Self {
        let ohlc = [column::OPEN, column::HIGH, column::LOW, column::CLOSE];
        let names = |cols: &[&str]| cols.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        let in_place = |cols: &[&str]| cols.iter().map(|c| ScaleTarget::in_place(c)).collect::<Vec<_>>();

        match kind {
            SchemaKind::Quote => {
                let mut numeric = ohlc.to_vec();
                numeric.extend([column::VOLUME, column::BID, column::ASK]);
                let mut scaled = numeric.clone();
                scaled.push(derived::SPREAD);
                Self {
                    kind,
                    time_col,
                    key_col: None,
                    numeric_cols: names(&numeric),
                    ohlc_cols: Some(OhlcColumns::default()),
                    quote_cols: Some(QuoteColumns::default()),
                    volume_col: Some(column::VOLUME.to_string()),
                    zero_sentinel_cols: Vec::new(),
                    scale_targets: in_place(&scaled),
                    derive_returns: true,
                    derive_spread: true,
                    split_pair: false,
                }
            }
            SchemaKind::Ohlcv => {
                let mut numeric = ohlc.to_vec();
                numeric.push(column::VOLUME);
                Self {
                    kind,
                    time_col,
                    key_col: None,
                    numeric_cols: names(&numeric),
                    ohlc_cols: Some(OhlcColumns::default()),
                    quote_cols: None,
                    volume_col: Some(column::VOLUME.to_string()),
                    zero_sentinel_cols: Vec::new(),
                    scale_targets: in_place(&numeric),
                    derive_returns: true,
                    derive_spread: false,
                    split_pair: false,
                }
            }
            SchemaKind::Ohlc => Self {
                kind,
                time_col,
                key_col: None,
                numeric_cols: names(&ohlc),
                ohlc_cols: Some(OhlcColumns::default()),
                quote_cols: None,
                volume_col: None,
                zero_sentinel_cols: Vec::new(),
                scale_targets: in_place(&ohlc),
                derive_returns: true,
                derive_spread: false,
                split_pair: false,
            },
            SchemaKind::FundingRate => Self {
                kind,
                time_col,
                key_col: None,
                numeric_cols: names(&[column::RATE]),
                ohlc_cols: None,
                quote_cols: None,
                volume_col: None,
                zero_sentinel_cols: names(&[column::RATE]),
                scale_targets: vec![ScaleTarget::into_new(column::RATE, derived::RATE_NORM)],
                derive_returns: false,
                derive_spread: false,
                split_pair: false,
            },
            SchemaKind::Price => Self {
                kind,
                time_col,
                key_col: None,
                numeric_cols: names(&[column::PRICE]),
                ohlc_cols: None,
                quote_cols: None,
                volume_col: None,
                zero_sentinel_cols: Vec::new(),
                scale_targets: in_place(&[column::PRICE]),
                derive_returns: false,
                derive_spread: false,
                split_pair: false,
            },
        }
    }

    /// Column the rolling mean is computed over
    pub fn primary_col(&self) -> &str {
        match self.kind {
            SchemaKind::Quote | SchemaKind::Ohlcv | SchemaKind::Ohlc => column::CLOSE,
            SchemaKind::FundingRate => column::RATE,
            SchemaKind::Price => column::PRICE,
        }
    }

    /// Names of the columns appended by feature derivation
    pub fn derived_cols(&self) -> Vec<&'static str> {
        let mut cols = Vec::new();
        if self.derive_returns {
            cols.extend([derived::DAILY_RETURN, derived::VOLATILITY, derived::LOG_RETURN]);
        }
        if self.derive_spread {
            cols.push(derived::SPREAD);
        }
        cols
    }
}
