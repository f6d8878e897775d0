//! Series Cleaning Service
//!
//! One routine for every raw snapshot layout, driven by the table's
//! [`SeriesSchema`](crate::models::SeriesSchema):
//!
//! 1. Sort ascending by timestamp (stable, so ties keep file order)
//! 2. Drop duplicate `(timestamp, key)` rows, keeping the first
//! 3. Replace sentinel zeros with missing (funding rates)
//! 4. Forward-fill gaps within each key; leading gaps stay missing
//! 5. Drop rows violating OHLC / volume / bid-ask invariants
//! 6. Rolling features on raw values when a window is configured
//! 7. Derive return, volatility and spread features
//! 8. Min-max rescale, scoped to this table only (before or after step 7)

use crate::constants::derived;
use crate::error::{AppError, Result};
use crate::models::{PipelineConfig, ScaleStage, ScaleTarget, SeriesRecord, SeriesTable};
use crate::services::{features, normalizer};
use crate::utils::deduplication::TimestampDeduplicator;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Row accounting for one `clean_series` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub rows_in: usize,
    pub duplicates_removed: usize,
    pub zeros_replaced: usize,
    pub values_filled: usize,
    pub invalid_removed: usize,
    pub rows_out: usize,
}

/// Column positions checked by row validation
#[derive(Debug, Default)]
struct ValidationColumns {
    ohlc: Option<[usize; 4]>,
    volume: Option<usize>,
    quote: Option<(usize, usize)>,
}

impl ValidationColumns {
    fn resolve(table: &SeriesTable) -> Self {
        let schema = &table.schema;

        let ohlc = schema.ohlc_cols.as_ref().and_then(|c| {
            Some([
                table.column_index(&c.open)?,
                table.column_index(&c.high)?,
                table.column_index(&c.low)?,
                table.column_index(&c.close)?,
            ])
        });
        let volume = schema.volume_col.as_deref().and_then(|c| table.column_index(c));
        let quote = schema
            .quote_cols
            .as_ref()
            .and_then(|c| Some((table.column_index(&c.bid)?, table.column_index(&c.ask)?)));

        Self { ohlc, volume, quote }
    }

    fn is_empty(&self) -> bool {
        self.ohlc.is_none() && self.volume.is_none() && self.quote.is_none()
    }
}

/// Clean one table
///
/// Fails with [`AppError::EmptySeries`] when no row survives.
pub fn clean_series(mut table: SeriesTable, config: &PipelineConfig) -> Result<(SeriesTable, CleanReport)> {
    let mut report = CleanReport {
        rows_in: table.len(),
        ..CleanReport::default()
    };

    clean_rows(&mut table, config.zero_as_missing, &mut report);

    if table.is_empty() {
        return Err(AppError::EmptySeries(format!(
            "{}: no rows survived validation ({} read, {} invalid)",
            table.source, report.rows_in, report.invalid_removed
        )));
    }

    apply_features_and_scaling(&mut table, config);

    report.rows_out = table.len();
    debug!(
        file = %table.source,
        rows_in = report.rows_in,
        duplicates = report.duplicates_removed,
        invalid = report.invalid_removed,
        rows_out = report.rows_out,
        "Cleaned series"
    );

    Ok((table, report))
}

/// Row-level stages: sort, dedup, zero sentinel, forward-fill, validation
pub fn clean_rows(table: &mut SeriesTable, zero_as_missing: bool, report: &mut CleanReport) {
    table.records.sort_by_key(|r| r.time);

    report.duplicates_removed += TimestampDeduplicator::retain_first(&mut table.records);

    if zero_as_missing {
        let sentinel_idx: Vec<usize> = table
            .schema
            .zero_sentinel_cols
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();
        report.zeros_replaced += replace_zeros(&mut table.records, &sentinel_idx);
    }

    report.values_filled += forward_fill(&mut table.records);

    let columns = ValidationColumns::resolve(table);
    if !columns.is_empty() {
        let before = table.records.len();
        table.records.retain(|r| is_valid_record(r, &columns));
        report.invalid_removed += before - table.records.len();
    }
}

/// Replace exact zeros with missing in the given columns
fn replace_zeros(records: &mut [SeriesRecord], columns: &[usize]) -> usize {
    let mut replaced = 0;
    for record in records.iter_mut() {
        for &idx in columns {
            if record.values[idx] == Some(0.0) {
                record.values[idx] = None;
                replaced += 1;
            }
        }
    }
    replaced
}

/// Forward-fill missing values per key, in record order
fn forward_fill(records: &mut [SeriesRecord]) -> usize {
    let mut last_seen: HashMap<String, Vec<Option<f64>>> = HashMap::new();
    let mut filled = 0;

    for record in records.iter_mut() {
        let last = last_seen
            .entry(record.key.clone())
            .or_insert_with(|| vec![None; record.values.len()]);

        for (value, prev) in record.values.iter_mut().zip(last.iter_mut()) {
            match value {
                Some(_) => *prev = *value,
                None => {
                    if prev.is_some() {
                        *value = *prev;
                        filled += 1;
                    }
                }
            }
        }
    }

    filled
}

/// Check one row against the invariants; a missing validated value fails it
fn is_valid_record(record: &SeriesRecord, columns: &ValidationColumns) -> bool {
    if let Some([o, h, l, c]) = columns.ohlc {
        let (Some(open), Some(high), Some(low), Some(close)) =
            (record.values[o], record.values[h], record.values[l], record.values[c])
        else {
            return false;
        };
        if !(low <= open.min(close) && high >= open.max(close)) {
            return false;
        }
    }

    if let Some(v) = columns.volume {
        match record.values[v] {
            Some(volume) if volume >= 0.0 => {}
            _ => return false,
        }
    }

    if let Some((b, a)) = columns.quote {
        match (record.values[b], record.values[a]) {
            (Some(bid), Some(ask)) if bid <= ask => {}
            _ => return false,
        }
    }

    true
}

/// Derived features, rolling features and rescaling in the configured order
fn apply_features_and_scaling(table: &mut SeriesTable, config: &PipelineConfig) {
    let derived_names = table.schema.derived_cols();
    let (derived_targets, raw_targets): (Vec<ScaleTarget>, Vec<ScaleTarget>) = table
        .schema
        .scale_targets
        .iter()
        .cloned()
        .partition(|t| derived_names.contains(&t.source.as_str()));

    // Rolling statistics always see raw-scale values
    if let Some(window) = config.window_size {
        features::derive_rolling_features(table, window);
    }

    match config.scale_stage {
        ScaleStage::AfterFeatures => {
            derive_features(table);
            normalizer::scale_table(table, &raw_targets);
        }
        ScaleStage::BeforeFeatures => {
            normalizer::scale_table(table, &raw_targets);
            derive_features(table);
        }
    }
    normalizer::scale_table(table, &derived_targets);

    if config.scale_derived {
        let already: Vec<&str> = derived_targets.iter().map(|t| t.source.as_str()).collect();
        let extra: Vec<ScaleTarget> = derived_names
            .iter()
            .chain([derived::ROLLING_MEAN, derived::ROLLING_VOLATILITY].iter())
            .filter(|name| !already.contains(name))
            .map(|name| ScaleTarget::in_place(name))
            .collect();
        normalizer::scale_table(table, &extra);
    }

    if table.schema.split_pair {
        split_pairs(table);
    }
}

fn derive_features(table: &mut SeriesTable) {
    if table.schema.derive_returns {
        features::derive_return_features(table);
    }
    if table.schema.derive_spread {
        features::derive_spread(table);
    }
}

/// Split `SOL/USDC:USDC` style keys into base and quote assets
pub fn split_pair(pair: &str) -> (String, String) {
    match pair.split_once('/') {
        Some((base, rest)) => {
            let quote = rest.split(':').next().unwrap_or(rest);
            (base.to_string(), quote.to_string())
        }
        None => (pair.to_string(), String::new()),
    }
}

fn split_pairs(table: &mut SeriesTable) {
    let (bases, quotes): (Vec<String>, Vec<String>) =
        table.records.iter().map(|r| split_pair(&r.key)).unzip();
    table.push_tag_column(derived::BASE, bases);
    table.push_tag_column(derived::QUOTE, quotes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SchemaKind, SeriesSchema};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
    }

    fn ohlcv(rows: &[(i64, [Option<f64>; 5])]) -> SeriesTable {
        let schema = SeriesSchema::for_kind(SchemaKind::Ohlcv, "timestamp".to_string());
        let mut table = SeriesTable::new("df_BTC_historical_data.csv".into(), "BTC".into(), schema);
        for (day, values) in rows {
            table.records.push(SeriesRecord::new(t(*day), "BTC".into(), values.to_vec()));
        }
        table
    }

    fn bar(o: f64, h: f64, l: f64, c: f64, v: f64) -> [Option<f64>; 5] {
        [Some(o), Some(h), Some(l), Some(c), Some(v)]
    }

    fn funding(rows: &[(i64, &str, Option<f64>)]) -> SeriesTable {
        let mut schema = SeriesSchema::for_kind(SchemaKind::FundingRate, "timestamp".to_string());
        schema.key_col = Some("pair".to_string());
        schema.split_pair = true;
        let mut table = SeriesTable::new("funding.csv".into(), "funding".into(), schema);
        for (day, pair, rate) in rows {
            table.records.push(SeriesRecord::new(t(*day), pair.to_string(), vec![*rate]));
        }
        table
    }

    fn assert_unit_range(values: &[Option<f64>]) {
        for v in values.iter().flatten() {
            assert!((0.0..=1.0).contains(v), "{} outside [0, 1]", v);
        }
    }

    #[test]
    fn test_duplicate_timestamp_keeps_first() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (1, bar(1.0, 1.0, 1.0, 1.0, 1.0)),
            (2, bar(11.0, 13.0, 10.0, 12.0, 150.0)),
        ]);

        let (cleaned, report) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(cleaned.records[0].time, t(1));
        assert_eq!(cleaned.records[1].time, t(2));

        // Returns are computed on the kept (first) t1 bar
        let returns = cleaned.column("daily_return").unwrap();
        assert!((returns[0].unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_sorts_and_timestamps_strictly_increase() {
        let table = ohlcv(&[
            (3, bar(10.0, 12.0, 9.0, 11.0, 1.0)),
            (1, bar(10.0, 12.0, 9.0, 11.0, 2.0)),
            (2, bar(10.0, 12.0, 9.0, 11.0, 3.0)),
            (1, bar(10.0, 12.0, 9.0, 11.0, 4.0)),
        ]);

        let (cleaned, _) = clean_series(table, &PipelineConfig::default()).unwrap();
        let times: Vec<_> = cleaned.records.iter().map(|r| r.time).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(times.len(), 3);
    }

    #[test]
    fn test_invalid_ohlc_rows_dropped() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, bar(10.0, 10.5, 9.0, 11.0, 100.0)), // high < close
            (3, bar(10.0, 12.0, 10.5, 11.0, 100.0)), // low > open
            (4, bar(10.0, 12.0, 9.0, 11.0, -1.0)), // negative volume
            (5, bar(11.0, 13.0, 10.0, 12.0, 150.0)),
        ]);

        let (cleaned, report) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(report.invalid_removed, 3);
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_ohlc_invariant_holds_on_surviving_rows() {
        let mut table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, bar(10.0, 10.5, 9.0, 11.0, 100.0)),
            (3, bar(12.0, 12.0, 12.0, 12.0, 0.0)),
        ]);
        let mut report = CleanReport::default();
        clean_rows(&mut table, true, &mut report);

        for r in &table.records {
            let v: Vec<f64> = r.values.iter().map(|v| v.unwrap()).collect();
            assert!(v[2] <= v[0].min(v[3]));
            assert!(v[1] >= v[0].max(v[3]));
        }
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_forward_fill_then_validate() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, [Some(10.5), None, Some(9.5), Some(11.0), None]),
        ]);

        let (cleaned, report) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(report.values_filled, 2);
        assert_eq!(cleaned.len(), 2);
        assert!(cleaned.records.iter().all(|r| r.values.iter().all(|v| v.is_some())));
    }

    #[test]
    fn test_leading_gap_in_ohlc_fails_validation() {
        let table = ohlcv(&[
            (1, [Some(10.0), None, Some(9.0), Some(11.0), Some(1.0)]),
            (2, bar(10.0, 12.0, 9.0, 11.0, 1.0)),
        ]);

        let (cleaned, report) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(report.invalid_removed, 1);
        assert_eq!(cleaned.len(), 1);
    }

    #[test]
    fn test_zero_open_row_retained_with_sentinel_scaling() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, bar(0.0, 2.0, 0.0, 1.0, 50.0)),
            (3, bar(11.0, 13.0, 10.0, 12.0, 150.0)),
        ]);

        let mut config = PipelineConfig::default();
        config.scale_derived = true;
        let (cleaned, _) = clean_series(table, &config).unwrap();

        assert_eq!(cleaned.len(), 3);
        let returns = cleaned.column("daily_return").unwrap();
        let logs = cleaned.column("log_return").unwrap();
        assert_eq!(returns[1], Some(0.0));
        assert_eq!(logs[1], Some(0.0));
        assert_unit_range(&returns);
    }

    #[test]
    fn test_zero_open_row_passes_through_non_finite_without_derived_scaling() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, bar(0.0, 2.0, 0.0, 1.0, 50.0)),
        ]);

        let (cleaned, _) = clean_series(table, &PipelineConfig::default()).unwrap();
        let returns = cleaned.column("daily_return").unwrap();
        assert!(!returns[1].unwrap().is_finite());
    }

    #[test]
    fn test_scaled_columns_hit_both_bounds() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, bar(11.0, 13.0, 10.0, 12.0, 150.0)),
            (3, bar(12.0, 15.0, 11.0, 14.0, 125.0)),
        ]);

        let (cleaned, _) = clean_series(table, &PipelineConfig::default()).unwrap();
        for name in ["open", "high", "low", "close", "volume"] {
            let values = cleaned.column(name).unwrap();
            assert_unit_range(&values);
            assert!(values.contains(&Some(0.0)), "{} never reaches 0", name);
            assert!(values.contains(&Some(1.0)), "{} never reaches 1", name);
        }
    }

    #[test]
    fn test_constant_column_scales_to_zero() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 7.0)),
            (2, bar(11.0, 13.0, 10.0, 12.0, 7.0)),
        ]);

        let (cleaned, _) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(cleaned.column("volume").unwrap(), vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_single_row_series() {
        let table = ohlcv(&[(1, bar(10.0, 12.0, 9.0, 11.0, 7.0))]);
        let (cleaned, _) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.records[0].values[..5], [Some(0.0); 5]);
    }

    #[test]
    fn test_no_surviving_rows_is_empty_series() {
        let table = ohlcv(&[(1, bar(10.0, 9.0, 9.0, 11.0, 7.0))]);
        let err = clean_series(table, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::EmptySeries(_)));
    }

    #[test]
    fn test_quote_validation_and_spread() {
        let schema = SeriesSchema::for_kind(SchemaKind::Quote, "timestamp".to_string());
        let mut table = SeriesTable::new("q.csv".into(), "q".into(), schema);
        let rows = [
            (1, [10.0, 12.0, 9.0, 11.0, 100.0, 10.9, 11.1]),
            (2, [11.0, 13.0, 10.0, 12.0, 100.0, 12.2, 12.0]), // bid > ask
            (3, [12.0, 14.0, 11.0, 13.0, 100.0, 12.8, 13.2]),
        ];
        for (day, values) in rows {
            let values = values.iter().map(|v| Some(*v)).collect();
            table.records.push(SeriesRecord::new(t(day), "q".into(), values));
        }

        let (cleaned, report) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(report.invalid_removed, 1);
        assert_eq!(cleaned.len(), 2);

        let spread = cleaned.column("spread").unwrap();
        assert_unit_range(&spread);
        assert_eq!(spread, vec![Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_funding_zero_sentinel_and_forward_fill() {
        let table = funding(&[
            (1, "SOL/USDC:USDC", Some(0.0)),
            (2, "SOL/USDC:USDC", Some(0.0002)),
            (3, "SOL/USDC:USDC", Some(0.0)),
            (4, "SOL/USDC:USDC", Some(0.0004)),
        ]);

        let (cleaned, report) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(report.zeros_replaced, 2);
        assert_eq!(report.values_filled, 1);

        // Leading gap has no prior value and stays missing
        let rates = cleaned.column("rate").unwrap();
        assert_eq!(rates, vec![None, Some(0.0002), Some(0.0002), Some(0.0004)]);

        let norm = cleaned.column("rate_norm").unwrap();
        assert_eq!(norm, vec![None, Some(0.0), Some(0.0), Some(1.0)]);

        assert_eq!(cleaned.tag_columns, vec!["base", "quote"]);
        assert_eq!(cleaned.records[0].tags, vec!["SOL".to_string(), "USDC".to_string()]);
    }

    #[test]
    fn test_funding_keep_zeros_when_disabled() {
        let table = funding(&[(1, "A/B", Some(0.0)), (2, "A/B", Some(0.5))]);
        let mut config = PipelineConfig::default();
        config.zero_as_missing = false;

        let (cleaned, report) = clean_series(table, &config).unwrap();
        assert_eq!(report.zeros_replaced, 0);
        assert_eq!(cleaned.column("rate").unwrap(), vec![Some(0.0), Some(0.5)]);
    }

    #[test]
    fn test_funding_dedup_and_fill_are_per_pair() {
        let table = funding(&[
            (1, "SOL/USDC", Some(0.1)),
            (1, "ETH/USDC", Some(0.2)),
            (1, "SOL/USDC", Some(0.9)),
            (2, "ETH/USDC", None),
            (2, "SOL/USDC", None),
        ]);

        let (cleaned, report) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(cleaned.len(), 4);

        let filled: Vec<(String, Option<f64>)> = cleaned
            .records
            .iter()
            .map(|r| (r.key.clone(), r.values[0]))
            .collect();
        assert!(filled.contains(&("SOL/USDC".to_string(), Some(0.1))));
        assert_eq!(filled.iter().filter(|(k, v)| k == "ETH/USDC" && *v == Some(0.2)).count(), 2);
    }

    #[test]
    fn test_funding_clean_is_idempotent() {
        let table = funding(&[
            (3, "SOL/USDC:USDC", Some(0.0003)),
            (1, "SOL/USDC:USDC", Some(0.0)),
            (2, "SOL/USDC:USDC", Some(0.0001)),
            (2, "SOL/USDC:USDC", Some(0.0009)),
        ]);

        let config = PipelineConfig::default();
        let (once, _) = clean_series(table, &config).unwrap();
        let (twice, report) = clean_series(once.clone(), &config).unwrap();

        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(report.invalid_removed, 0);
        assert_eq!(once.columns, twice.columns);
        assert_eq!(once.records, twice.records);
    }

    #[test]
    fn test_row_stages_are_idempotent() {
        let mut table = ohlcv(&[
            (2, bar(11.0, 13.0, 10.0, 12.0, 150.0)),
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (1, bar(1.0, 1.0, 1.0, 1.0, 1.0)),
            (3, bar(10.0, 9.0, 9.0, 11.0, 1.0)),
        ]);

        let mut first = CleanReport::default();
        clean_rows(&mut table, true, &mut first);
        let snapshot = table.records.clone();

        let mut second = CleanReport::default();
        clean_rows(&mut table, true, &mut second);
        assert_eq!(table.records, snapshot);
        assert_eq!(second, CleanReport::default());
    }

    #[test]
    fn test_scale_before_features_uses_scaled_prices() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, bar(12.0, 14.0, 11.0, 13.0, 150.0)),
        ]);

        let mut config = PipelineConfig::default();
        config.scale_stage = ScaleStage::BeforeFeatures;
        let (cleaned, _) = clean_series(table, &config).unwrap();

        // open scales to 0 on the first row, so its return is non-finite
        let returns = cleaned.column("daily_return").unwrap();
        assert!(!returns[0].unwrap().is_finite());
        assert!((returns[1].unwrap() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_features_when_window_set() {
        let table = ohlcv(&[
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, bar(11.0, 13.0, 10.0, 12.0, 150.0)),
            (3, bar(12.0, 15.0, 11.0, 14.0, 125.0)),
        ]);

        let mut config = PipelineConfig::default();
        config.window_size = Some(2);
        let (cleaned, _) = clean_series(table, &config).unwrap();

        let means = cleaned.column("rolling_mean").unwrap();
        assert_eq!(means, vec![None, Some(11.5), Some(13.0)]);
        assert!(cleaned.column("rolling_volatility").is_some());
    }

    #[test]
    fn test_rolling_features_use_raw_prices_before_scaling() {
        let rows = [
            (1, bar(10.0, 12.0, 9.0, 11.0, 100.0)),
            (2, bar(11.0, 13.0, 10.0, 12.0, 150.0)),
            (3, bar(12.0, 15.0, 11.0, 14.0, 125.0)),
        ];

        let mut config = PipelineConfig::default();
        config.window_size = Some(2);
        let (after, _) = clean_series(ohlcv(&rows), &config).unwrap();

        config.scale_stage = ScaleStage::BeforeFeatures;
        let (before, _) = clean_series(ohlcv(&rows), &config).unwrap();

        assert_eq!(before.column("rolling_mean").unwrap(), vec![None, Some(11.5), Some(13.0)]);
        assert_eq!(before.column("rolling_mean"), after.column("rolling_mean"));
        assert_eq!(before.column("rolling_volatility"), after.column("rolling_volatility"));
    }

    #[test]
    fn test_price_snapshot_keeps_leading_volume_gap() {
        let schema = SeriesSchema::detect(&[
            "timestamp".to_string(),
            "price".to_string(),
            "market_cap".to_string(),
            "volume".to_string(),
        ])
        .unwrap();
        let mut table = SeriesTable::new("SOL_90days.csv".into(), "SOL".into(), schema);
        table.records = vec![
            SeriesRecord::new(t(1), "SOL".into(), vec![Some(100.0), Some(5.0), None]),
            SeriesRecord::new(t(2), "SOL".into(), vec![Some(110.0), Some(6.0), Some(20.0)]),
            SeriesRecord::new(t(3), "SOL".into(), vec![Some(105.0), Some(7.0), Some(30.0)]),
        ];

        let (cleaned, report) = clean_series(table, &PipelineConfig::default()).unwrap();
        assert_eq!(cleaned.len(), 3);
        assert_eq!(report.invalid_removed, 0);
        assert_eq!(cleaned.column("volume").unwrap(), vec![None, Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("SOL/USDC:USDC"), ("SOL".to_string(), "USDC".to_string()));
        assert_eq!(split_pair("BTC/USDT"), ("BTC".to_string(), "USDT".to_string()));
        assert_eq!(split_pair("BTCUSDT"), ("BTCUSDT".to_string(), String::new()));
    }
}
