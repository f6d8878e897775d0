//! Derived features for cleaned series
//!
//! Per-row features use only that row's own bar. Division by a zero `open`
//! is not guarded: the resulting non-finite value is kept and later treated
//! as missing by the normalizer.

use crate::constants::derived;
use crate::models::SeriesTable;

/// Intrabar return: (close - open) / open
pub fn daily_return(open: f64, close: f64) -> f64 {
    (close - open) / open
}

/// Intrabar range relative to open: (high - low) / open
pub fn volatility(open: f64, high: f64, low: f64) -> f64 {
    (high - low) / open
}

/// Log return: ln(close / open)
pub fn log_return(open: f64, close: f64) -> f64 {
    (close / open).ln()
}

/// Append daily_return, volatility and log_return from the OHLC columns
///
/// Does nothing for tables without OHLC columns.
pub fn derive_return_features(table: &mut SeriesTable) {
    let Some(ohlc) = table.schema.ohlc_cols.clone() else {
        return;
    };

    let (Some(open), Some(high), Some(low), Some(close)) = (
        table.column(&ohlc.open),
        table.column(&ohlc.high),
        table.column(&ohlc.low),
        table.column(&ohlc.close),
    ) else {
        return;
    };

    let mut returns = Vec::with_capacity(table.len());
    let mut ranges = Vec::with_capacity(table.len());
    let mut logs = Vec::with_capacity(table.len());

    for i in 0..table.len() {
        match (open[i], high[i], low[i], close[i]) {
            (Some(o), Some(h), Some(l), Some(c)) => {
                returns.push(Some(daily_return(o, c)));
                ranges.push(Some(volatility(o, h, l)));
                logs.push(Some(log_return(o, c)));
            }
            _ => {
                returns.push(None);
                ranges.push(None);
                logs.push(None);
            }
        }
    }

    table.set_column(derived::DAILY_RETURN, returns);
    table.set_column(derived::VOLATILITY, ranges);
    table.set_column(derived::LOG_RETURN, logs);
}

/// Append `spread = ask - bid`
pub fn derive_spread(table: &mut SeriesTable) {
    let Some(quote) = table.schema.quote_cols.clone() else {
        return;
    };

    let (Some(bid), Some(ask)) = (table.column(&quote.bid), table.column(&quote.ask)) else {
        return;
    };

    let spread = bid
        .iter()
        .zip(&ask)
        .map(|(b, a)| match (b, a) {
            (Some(b), Some(a)) => Some(a - b),
            _ => None,
        })
        .collect();

    table.set_column(derived::SPREAD, spread);
}

/// Trailing rolling mean
///
/// A value is produced only once `window` rows exist and every value in the
/// window is finite.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing rolling sample standard deviation (n - 1 denominator)
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    })
}

fn rolling_apply<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];

    if window < 2 || values.len() < window {
        return out;
    }

    let mut buf = Vec::with_capacity(window);
    for i in (window - 1)..values.len() {
        buf.clear();
        buf.extend(
            values[i + 1 - window..=i]
                .iter()
                .filter_map(|v| *v)
                .filter(|v| v.is_finite()),
        );
        if buf.len() == window {
            out[i] = Some(f(&buf));
        }
    }

    out
}

/// Append rolling_volatility (std of daily return) and rolling_mean of the
/// schema's primary column
///
/// Reads the OHLC columns directly, so it must run before any rescaling.
/// Tables holding several keys (funding files) are windowed per key.
pub fn derive_rolling_features(table: &mut SeriesTable, window: usize) {
    let primary = table.schema.primary_col().to_string();

    if let Some(values) = table.column(&primary) {
        let means = per_key(table, &values, |v| rolling_mean(v, window));
        table.set_column(derived::ROLLING_MEAN, means);
    }

    if table.schema.derive_returns {
        if let Some(returns) = bar_returns(table) {
            let stds = per_key(table, &returns, |v| rolling_std(v, window));
            table.set_column(derived::ROLLING_VOLATILITY, stds);
        }
    }
}

fn bar_returns(table: &SeriesTable) -> Option<Vec<Option<f64>>> {
    let ohlc = table.schema.ohlc_cols.as_ref()?;
    let open = table.column(&ohlc.open)?;
    let close = table.column(&ohlc.close)?;

    Some(
        open.iter()
            .zip(&close)
            .map(|(o, c)| match (o, c) {
                (Some(o), Some(c)) => Some(daily_return(*o, *c)),
                _ => None,
            })
            .collect(),
    )
}

/// Apply `f` to each key's sub-sequence and scatter the results back
fn per_key<F>(table: &SeriesTable, values: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(&[Option<f64>]) -> Vec<Option<f64>>,
{
    let mut out = vec![None; values.len()];

    for key in table.keys() {
        let positions: Vec<usize> = table
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.key == key)
            .map(|(i, _)| i)
            .collect();
        let subset: Vec<Option<f64>> = positions.iter().map(|&i| values[i]).collect();
        for (pos, value) in positions.into_iter().zip(f(&subset)) {
            out[pos] = value;
        }
    }

    out
}
