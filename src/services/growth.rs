// src/services/growth.rs
use serde::Serialize;

use crate::models::{EngineError, LineSeries};

/// Length of the explicit forecast horizon, in years.
pub const FORECAST_YEARS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct GrowthForecast {
    pub history: LineSeries,
    pub projection: LineSeries,
    /// Mean of period-over-period changes; None with fewer than 2 periods.
    pub avg_growth: Option<f64>,
    /// The rate actually applied (override, else the historical average).
    pub growth_rate: f64,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Extrapolate the revenue base over the forecast horizon by compounding the
/// historical average growth rate, or an explicit override, from the last
/// historical value. Fewer than 2 historical periods without an override is
/// an insufficient-history error.
pub fn project_revenue(
    history: &LineSeries,
    growth_override: Option<f64>,
) -> Result<GrowthForecast, EngineError> {
    let changes = history.pct_change();
    let avg_growth = mean(&changes);

    let growth_rate = growth_override
        .or(avg_growth)
        .ok_or(EngineError::InsufficientHistory {
            periods: history.len(),
            pairs: changes.len(),
        })?;

    let (last_year, last_value) = history
        .last()
        .ok_or(EngineError::InsufficientHistory { periods: 0, pairs: 0 })?;

    let mut projection = LineSeries::new();
    let mut value = last_value;
    for step in 1..=FORECAST_YEARS as i32 {
        value *= 1.0 + growth_rate;
        projection.insert(last_year + step, value);
    }

    Ok(GrowthForecast {
        history: history.clone(),
        projection,
        avg_growth,
        growth_rate,
    })
}
