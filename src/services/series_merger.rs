//! Series Merge Service
//!
//! Concatenates cleaned tables into one. Only columns present in every
//! table survive; everything else is reported as dropped. Rows are ordered
//! by `(series_key, timestamp)`.

use crate::models::{SeriesRecord, SeriesTable};
use serde::Serialize;
use tracing::debug;

/// Row-wise concatenation of cleaned tables
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    /// Numeric columns common to every input table
    pub columns: Vec<String>,

    /// Text columns common to every input table
    pub tag_columns: Vec<String>,

    /// Rows ordered by (key, time); `key` is the output `series_key`
    pub records: Vec<SeriesRecord>,
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Columns dropped because they were missing from at least one table
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub tables: usize,
    pub rows: usize,
    pub dropped_columns: Vec<String>,
}

/// Columns of `first` present in every table, in `first`'s order
fn common_columns<'a, F>(tables: &'a [SeriesTable], columns_of: F) -> Vec<String>
where
    F: Fn(&'a SeriesTable) -> &'a [String],
{
    let Some(first) = tables.first() else {
        return Vec::new();
    };

    columns_of(first)
        .iter()
        .filter(|c| tables.iter().all(|t| columns_of(t).contains(c)))
        .cloned()
        .collect()
}

/// Merge cleaned tables into one
pub fn merge_series(tables: &[SeriesTable]) -> (MergedTable, MergeReport) {
    let columns = common_columns(tables, |t| t.columns.as_slice());
    let tag_columns = common_columns(tables, |t| t.tag_columns.as_slice());

    let mut dropped_columns: Vec<String> = Vec::new();
    for table in tables {
        for name in table.columns.iter().chain(&table.tag_columns) {
            if !columns.contains(name) && !tag_columns.contains(name) && !dropped_columns.contains(name) {
                dropped_columns.push(name.clone());
            }
        }
    }

    if !dropped_columns.is_empty() {
        debug!(columns = ?dropped_columns, "Dropping columns not shared by every series");
    }

    let total: usize = tables.iter().map(|t| t.len()).sum();
    let mut records = Vec::with_capacity(total);

    for table in tables {
        let value_idx: Vec<usize> = columns
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();
        let tag_idx: Vec<usize> = tag_columns
            .iter()
            .filter_map(|c| table.tag_index(c))
            .collect();

        for record in &table.records {
            records.push(SeriesRecord {
                time: record.time,
                key: record.key.clone(),
                values: value_idx.iter().map(|&i| record.values[i]).collect(),
                tags: tag_idx.iter().map(|&i| record.tags[i].clone()).collect(),
            });
        }
    }

    // Stable: equal (key, time) pairs from different files keep input order
    records.sort_by(|a, b| a.key.cmp(&b.key).then(a.time.cmp(&b.time)));

    let report = MergeReport {
        tables: tables.len(),
        rows: records.len(),
        dropped_columns,
    };

    (
        MergedTable {
            columns,
            tag_columns,
            records,
        },
        report,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SchemaKind, SeriesSchema};
    use chrono::{TimeZone, Utc};

    fn table(source: &str, key: &str, columns: &[&str], days: &[u32]) -> SeriesTable {
        let schema = SeriesSchema::for_kind(SchemaKind::Price, "timestamp".to_string());
        let mut table = SeriesTable::new(source.into(), key.into(), schema);
        table.columns = columns.iter().map(|c| c.to_string()).collect();
        for &day in days {
            let time = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
            let values = (0..columns.len()).map(|i| Some(day as f64 + i as f64)).collect();
            table.records.push(SeriesRecord::new(time, key.into(), values));
        }
        table
    }

    #[test]
    fn test_merge_keeps_only_common_columns() {
        let a = table("a.csv", "A", &["open", "close", "volume"], &[1, 2]);
        let b = table("b.csv", "B", &["close", "bid", "open"], &[1, 2, 3]);

        let (merged, report) = merge_series(&[a, b]);
        assert_eq!(merged.columns, vec!["open", "close"]);
        assert_eq!(merged.len(), 5);
        assert_eq!(report.rows, 5);
        assert_eq!(report.dropped_columns, vec!["volume", "bid"]);

        // Values follow the column, not the position in the source table
        let b_first = merged.records.iter().find(|r| r.key == "B").unwrap();
        assert_eq!(b_first.values, vec![Some(3.0), Some(1.0)]);
    }

    #[test]
    fn test_merge_orders_by_key_then_time() {
        let b = table("b.csv", "B", &["price"], &[2, 1]);
        let a = table("a.csv", "A", &["price"], &[3, 1]);

        let (merged, _) = merge_series(&[b, a]);
        let order: Vec<(String, u32)> = merged
            .records
            .iter()
            .map(|r| (r.key.clone(), chrono::Datelike::day(&r.time)))
            .collect();
        assert_eq!(
            order,
            vec![("A".into(), 1), ("A".into(), 3), ("B".into(), 1), ("B".into(), 2)]
        );
    }

    #[test]
    fn test_merge_empty() {
        let (merged, report) = merge_series(&[]);
        assert!(merged.is_empty());
        assert!(merged.columns.is_empty());
        assert_eq!(report.tables, 0);
    }
}
