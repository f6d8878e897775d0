//! Min-max normalization
//!
//! A scaler is fitted to one column of one series and dropped after the
//! transform; no bounds are shared across columns, files or runs.

use crate::models::{ScaleTarget, SeriesTable};
use tracing::debug;

/// Fitted min/max bounds of a single column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    pub min: f64,
    pub max: f64,
}

impl MinMaxScaler {
    /// Fit on the finite values of a column
    ///
    /// Returns `None` when the column has no finite value at all.
    pub fn fit(values: &[Option<f64>]) -> Option<Self> {
        let mut finite = values.iter().filter_map(|v| *v).filter(|v| v.is_finite());
        let first = finite.next()?;

        let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }

    /// Whether every finite value in the fitted column was equal
    pub fn is_constant(&self) -> bool {
        self.max == self.min
    }

    /// Scale one value into [0, 1]
    ///
    /// Missing stays missing. Non-finite values and every value of a constant
    /// column map to `0`.
    pub fn transform(&self, value: Option<f64>) -> Option<f64> {
        let v = value?;
        if !v.is_finite() || self.is_constant() {
            return Some(0.0);
        }
        Some((v - self.min) / (self.max - self.min))
    }
}

/// Rescale a column to [0, 1], following [`MinMaxScaler::transform`]
pub fn min_max_scale(values: &[Option<f64>]) -> Vec<Option<f64>> {
    match MinMaxScaler::fit(values) {
        Some(scaler) => values.iter().map(|v| scaler.transform(*v)).collect(),
        // Nothing finite to fit on: non-finite values still take the sentinel
        None => values.iter().map(|v| v.map(|_| 0.0)).collect(),
    }
}

/// Apply each scale target to the table
///
/// Targets whose source column is absent are skipped.
pub fn scale_table(table: &mut SeriesTable, targets: &[ScaleTarget]) {
    for target in targets {
        let Some(values) = table.column(&target.source) else {
            debug!(file = %table.source, column = %target.source, "Scale source column absent, skipping");
            continue;
        };

        let scaled = min_max_scale(&values);
        table.set_column(&target.target, scaled);
    }
}
