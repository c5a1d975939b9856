// src/services/margins.rs
use serde::Serialize;

use crate::models::LineSeries;

/// A dependent line item forecast by holding its ratio to the revenue base
/// constant over the horizon.
#[derive(Debug, Clone, Serialize)]
pub struct MarginForecast {
    pub history: LineSeries,
    pub projection: LineSeries,
    /// Ratio applied to the projected base; None means the metric was
    /// unavailable and the series was zero-filled.
    pub margin: Option<f64>,
}

impl MarginForecast {
    /// Historical and projected values joined on one period axis.
    pub fn combined(&self) -> LineSeries {
        self.history.concat(&self.projection)
    }
}

/// Historical margin: mean of dependent/base over the periods present in
/// both series, skipping zero-base periods. None when nothing overlaps.
fn historical_margin(item: &LineSeries, base: &LineSeries) -> Option<f64> {
    let ratios: Vec<f64> = item
        .iter()
        .filter_map(|(p, v)| match base.get(p) {
            Some(b) if b != 0.0 => Some(v / b),
            _ => None,
        })
        .collect();

    if ratios.is_empty() {
        None
    } else {
        Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
    }
}

/// Forecast a dependent line item against the revenue base. When neither a
/// historical margin nor an override is available the combined series is
/// replaced with explicit zeros over the base period index, so downstream
/// cash-flow arithmetic stays numerically defined.
pub fn forecast_from_margin(
    item_history: &LineSeries,
    base_history: &LineSeries,
    base_projection: &LineSeries,
    margin_override: Option<f64>,
) -> MarginForecast {
    let computed = historical_margin(item_history, base_history);

    match margin_override.or(computed) {
        Some(margin) => MarginForecast {
            history: item_history.clone(),
            projection: base_projection.map_values(|v| v * margin),
            margin: Some(margin),
        },
        None => MarginForecast {
            history: LineSeries::zeros(base_history.periods()),
            projection: LineSeries::zeros(base_projection.periods()),
            margin: None,
        },
    }
}
