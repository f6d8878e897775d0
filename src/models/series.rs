use crate::models::SeriesSchema;
use chrono::{DateTime, Utc};

/// One observation of a series
///
/// `values` is aligned with [`SeriesTable::columns`], `tags` with
/// [`SeriesTable::tag_columns`]. `None` marks a missing value; a non-finite
/// `Some` marks a derived feature that could not be computed (e.g. `open == 0`).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRecord {
    /// Timestamp of the observation
    pub time: DateTime<Utc>,

    /// Instrument/pool/pair this row belongs to
    pub key: String,

    pub values: Vec<Option<f64>>,

    pub tags: Vec<String>,
}

impl SeriesRecord {
    pub fn new(time: DateTime<Utc>, key: String, values: Vec<Option<f64>>) -> Self {
        Self {
            time,
            key,
            values,
            tags: Vec::new(),
        }
    }
}

/// A table read from one source file
#[derive(Debug, Clone)]
pub struct SeriesTable {
    /// File name the table was read from
    pub source: String,

    /// Key derived from the file name, used when rows carry no key column
    pub series_key: String,

    pub schema: SeriesSchema,

    /// Numeric column names
    pub columns: Vec<String>,

    /// Text column names
    pub tag_columns: Vec<String>,

    pub records: Vec<SeriesRecord>,
}

impl SeriesTable {
    pub fn new(source: String, series_key: String, schema: SeriesSchema) -> Self {
        let columns = schema.numeric_cols.clone();
        Self {
            source,
            series_key,
            schema,
            columns,
            tag_columns: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn tag_index(&self, name: &str) -> Option<usize> {
        self.tag_columns.iter().position(|c| c == name)
    }

    /// Copy one numeric column out of the records
    pub fn column_values(&self, idx: usize) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.values[idx]).collect()
    }

    /// Values of a named column, if present
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column_index(name).map(|idx| self.column_values(idx))
    }

    /// Write `values` into the named column, appending it if it does not exist
    ///
    /// `values.len()` must equal the number of records.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.records.len());
        match self.column_index(name) {
            Some(idx) => {
                for (record, value) in self.records.iter_mut().zip(values) {
                    record.values[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (record, value) in self.records.iter_mut().zip(values) {
                    record.values.push(value);
                }
            }
        }
    }

    /// Append a text column
    pub fn push_tag_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.records.len());
        match self.tag_index(name) {
            Some(idx) => {
                for (record, value) in self.records.iter_mut().zip(values) {
                    record.tags[idx] = value;
                }
            }
            None => {
                self.tag_columns.push(name.to_string());
                for (record, value) in self.records.iter_mut().zip(values) {
                    record.tags.push(value);
                }
            }
        }
    }

    /// Distinct row keys in first-seen order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for record in &self.records {
            if !keys.iter().any(|k| k == &record.key) {
                keys.push(record.key.clone());
            }
        }
        keys
    }
}
