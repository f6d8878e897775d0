//! Timestamp Deduplication Utilities
//!
//! Rows are duplicates when they share a timestamp within the same series
//! key. Funding-rate snapshots carry several pairs in one file, so the key
//! is part of the identity; single-instrument files all share one key.

use crate::models::SeriesRecord;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Identity of a row for deduplication
pub type DedupKey = (DateTime<Utc>, String);

/// Deduplication on `(timestamp, series key)`
pub struct TimestampDeduplicator;

impl TimestampDeduplicator {
    pub fn get_key(record: &SeriesRecord) -> DedupKey {
        (record.time, record.key.clone())
    }

    /// Drop duplicates in place, keeping the first occurrence
    ///
    /// Returns the number of rows removed.
    pub fn retain_first(records: &mut Vec<SeriesRecord>) -> usize {
        let before = records.len();
        let mut seen_keys = HashSet::new();
        records.retain(|record| seen_keys.insert(Self::get_key(record)));
        before - records.len()
    }
}
