// src/services/resolver.rs
use chrono::{Datelike, NaiveDate};
use log::warn;
use std::collections::BTreeMap;
use strsim::normalized_levenshtein;

use crate::models::{LineSeries, StatementTable, UNIT_SCALE};

/// Minimum similarity for a fuzzy line-item match.
pub const DEFAULT_MATCH_CUTOFF: f64 = 0.6;

/// Locate `target` among the available line-item names. An exact match always
/// wins; otherwise the best candidate scoring at or above `cutoff` under
/// normalized Levenshtein similarity is returned. The scan keeps the first
/// strictly-best candidate, so ties resolve to the earliest name offered.
pub fn resolve_line_item<'a>(
    available: impl IntoIterator<Item = &'a str>,
    target: &str,
    cutoff: f64,
) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;

    for name in available {
        if name == target {
            return Some(name);
        }
        let score = normalized_levenshtein(name, target);
        if score >= cutoff && best.map_or(true, |(_, s)| score > s) {
            best = Some((name, score));
        }
    }

    best.map(|(name, _)| name)
}

/// Collapse a raw period-end-keyed series into annual buckets: values are
/// grouped by the calendar year of their period-end date and summed.
pub fn annualize(raw: &BTreeMap<NaiveDate, f64>) -> LineSeries {
    let mut series = LineSeries::new();
    for (date, value) in raw {
        let year = date.year();
        let bucket = series.get(year).unwrap_or(0.0);
        series.insert(year, bucket + value);
    }
    series
}

/// Resolve a line item in a statement and return its annualized history in
/// billions. `as_magnitude` applies the capex sign convention: values are
/// stored as non-negative magnitudes so downstream arithmetic subtracts them
/// explicitly. None means the item is absent even after fuzzy matching.
pub fn extract_line(
    table: &StatementTable,
    target: &str,
    cutoff: f64,
    as_magnitude: bool,
) -> Option<LineSeries> {
    let resolved = match resolve_line_item(table.line_names(), target, cutoff) {
        Some(name) => name,
        None => {
            warn!("Line item '{}' not found in statement", target);
            return None;
        }
    };

    let raw = table.raw_series(resolved)?;
    let annual = annualize(raw).map_values(|v| {
        let scaled = v / UNIT_SCALE;
        if as_magnitude {
            scaled.abs()
        } else {
            scaled
        }
    });
    Some(annual)
}

/// Latest reported raw value of a line item, in billions. Balance-sheet
/// levels for the net-debt bridge come from here rather than from the
/// annualized series, since levels must not be summed across quarters.
pub fn latest_value(table: &StatementTable, target: &str, cutoff: f64) -> Option<f64> {
    let resolved = resolve_line_item(table.line_names(), target, cutoff)?;
    table
        .raw_series(resolved)?
        .iter()
        .next_back()
        .map(|(_, v)| v / UNIT_SCALE)
}
