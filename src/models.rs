// src/models.rs
use serde::Serialize;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Calendar year. All annualized series are indexed by Period.
pub type Period = i32;

/// Monetary series are normalized to billions at extraction time.
pub const UNIT_SCALE: f64 = 1e9;

/// An annual monetary series: ordered mapping from calendar year to value.
/// The BTreeMap keeps periods strictly increasing and unique by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LineSeries(BTreeMap<Period, f64>);

impl LineSeries {
    pub fn new() -> Self {
        LineSeries(BTreeMap::new())
    }

    pub fn insert(&mut self, period: Period, value: f64) {
        self.0.insert(period, value);
    }

    pub fn get(&self, period: Period) -> Option<f64> {
        self.0.get(&period).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<(Period, f64)> {
        self.0.iter().next().map(|(p, v)| (*p, *v))
    }

    pub fn last(&self) -> Option<(Period, f64)> {
        self.0.iter().next_back().map(|(p, v)| (*p, *v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, f64)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.0.keys().copied()
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> LineSeries {
        LineSeries(self.0.iter().map(|(p, v)| (*p, f(*v))).collect())
    }

    /// Union of two series; on a shared period the other series wins.
    /// Used to join history with a projection covering later years.
    pub fn concat(&self, other: &LineSeries) -> LineSeries {
        let mut joined = self.0.clone();
        for (p, v) in &other.0 {
            joined.insert(*p, *v);
        }
        LineSeries(joined)
    }

    /// Combine values on the intersection of periods.
    pub fn zip_with(&self, other: &LineSeries, f: impl Fn(f64, f64) -> f64) -> LineSeries {
        LineSeries(
            self.0
                .iter()
                .filter_map(|(p, v)| other.0.get(p).map(|w| (*p, f(*v, *w))))
                .collect(),
        )
    }

    /// Percentage change between each pair of consecutive entries.
    /// Pairs whose earlier value is zero are skipped.
    pub fn pct_change(&self) -> Vec<f64> {
        self.0
            .values()
            .zip(self.0.values().skip(1))
            .filter(|(prev, _)| **prev != 0.0)
            .map(|(prev, next)| next / prev - 1.0)
            .collect()
    }

    /// First difference, keyed by the later period of each pair.
    /// The earliest period has no prior entry and is omitted.
    pub fn diff(&self) -> LineSeries {
        LineSeries(
            self.0
                .iter()
                .zip(self.0.iter().skip(1))
                .map(|((_, prev), (p, next))| (*p, next - prev))
                .collect(),
        )
    }

    pub fn zeros(periods: impl IntoIterator<Item = Period>) -> LineSeries {
        LineSeries(periods.into_iter().map(|p| (p, 0.0)).collect())
    }
}

impl FromIterator<(Period, f64)> for LineSeries {
    fn from_iter<T: IntoIterator<Item = (Period, f64)>>(iter: T) -> Self {
        LineSeries(iter.into_iter().collect())
    }
}

/// A reported financial statement: line-item name to a raw series keyed by
/// period-end date. Sub-annual periods may be present; callers annualize
/// before using a line as history. Names iterate in sorted order so fuzzy
/// tie-breaks are reproducible.
#[derive(Debug, Clone, Default)]
pub struct StatementTable {
    lines: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl StatementTable {
    pub fn new() -> Self {
        StatementTable {
            lines: BTreeMap::new(),
        }
    }

    pub fn insert_point(&mut self, line_item: &str, period_end: NaiveDate, value: f64) {
        self.lines
            .entry(line_item.to_string())
            .or_default()
            .insert(period_end, value);
    }

    pub fn line_names(&self) -> impl Iterator<Item = &str> {
        self.lines.keys().map(|s| s.as_str())
    }

    pub fn raw_series(&self, line_item: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.lines.get(line_item)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Scalar company-info record from the provider, in raw (unscaled) units.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompanyProfile {
    pub market_cap: f64,
    pub beta: f64,
    pub shares_outstanding: f64,
}

/// Capital-structure figures as of the latest reported period, normalized to
/// the same denomination as the statement series.
#[derive(Debug, Clone, Serialize)]
pub struct CapitalStructure {
    pub market_cap: f64,
    pub total_debt: f64,
    pub beta: f64,
    pub interest_expense: Option<f64>,
    pub cash: f64,
    pub shares_outstanding: f64,
}

/// Errors raised by the valuation engine. Missing line items are not errors;
/// they surface as None margins and zero-filled series instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("insufficient history: {pairs} usable growth pair(s) from {periods} period(s); need at least 2 consecutive valued periods, or an explicit growth override")]
    InsufficientHistory { periods: usize, pairs: usize },

    #[error("invalid assumption: {0}")]
    InvalidAssumption(String),
}
