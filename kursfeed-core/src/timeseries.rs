//! History-series normalization shared by all vendor adapters.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::{HistoryPoint, SeriesPoint};

/// Normalize a raw provider series into canonical history points.
///
/// Duplicate dates collapse to the last sample seen (vendors occasionally
/// repeat the current session), output is sorted ascending by date, and
/// `normalized_change_pct` is computed against the first close. When the
/// first close is non-positive the percentage base is meaningless and every
/// point reports `0.0`.
#[must_use]
pub fn normalize(raw: Vec<SeriesPoint>) -> Vec<HistoryPoint> {
    let deduped: BTreeMap<NaiveDate, SeriesPoint> =
        raw.into_iter().map(|p| (p.date, p)).collect();

    let first_close = deduped.values().next().map_or(0.0, |p| p.close);
    let base_valid = first_close > 0.0;

    deduped
        .into_values()
        .map(|p| HistoryPoint {
            date: p.date,
            close: p.close,
            volume: p.volume,
            normalized_change_pct: if base_valid {
                (p.close - first_close) / first_close * 100.0
            } else {
                0.0
            },
        })
        .collect()
}
