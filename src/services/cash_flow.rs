// src/services/cash_flow.rs
use serde::Serialize;

use crate::models::{EngineError, LineSeries, Period};
use crate::services::growth::FORECAST_YEARS;

/// Default perpetuity growth rate beyond the explicit horizon.
pub const DEFAULT_TERMINAL_GROWTH: f64 = 0.02;

/// Forecast lines feeding the free-cash-flow build-up, each spanning the
/// combined historical+projected period axis.
#[derive(Debug, Clone)]
pub struct CashFlowLines {
    pub ebit: LineSeries,
    pub depreciation: LineSeries,
    pub receivables: LineSeries,
    pub inventory: LineSeries,
    pub payables: LineSeries,
    pub capex: LineSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashFlowForecast {
    pub ebiat: LineSeries,
    pub delta_nwc: LineSeries,
    pub ufcf: LineSeries,
    /// Present value per projected period only (t = 1..5).
    pub pv_ufcf: LineSeries,
    pub terminal_value: f64,
    pub pv_terminal_value: f64,
}

/// Assemble unlevered free cash flow and discount it.
///
/// UFCF = EBIT(1 - tax) + D&A - capex - change in net working capital, with
/// NWC = receivables + inventory - payables and the earliest period's change
/// treated as zero. Discounting covers the projected periods only, counting
/// t from the first year at or after `first_forecast_year`. Terminal value
/// uses perpetuity growth off the final projected cash flow and requires
/// terminal_growth strictly below the WACC.
pub fn build_cash_flow(
    lines: &CashFlowLines,
    first_forecast_year: Period,
    tax_rate: f64,
    wacc: f64,
    terminal_growth: f64,
) -> Result<CashFlowForecast, EngineError> {
    if terminal_growth >= wacc {
        return Err(EngineError::InvalidAssumption(format!(
            "terminal growth ({:.4}) must be strictly below WACC ({:.4})",
            terminal_growth, wacc
        )));
    }

    let ebiat = lines.ebit.map_values(|v| v * (1.0 - tax_rate));

    let nwc = lines
        .receivables
        .zip_with(&lines.inventory, |r, i| r + i)
        .zip_with(&lines.payables, |wc, p| wc - p);
    let delta_nwc = nwc.diff();

    let ufcf: LineSeries = ebiat
        .iter()
        .map(|(p, v)| {
            let da = lines.depreciation.get(p).unwrap_or(0.0);
            let capex = lines.capex.get(p).unwrap_or(0.0);
            let dn = delta_nwc.get(p).unwrap_or(0.0);
            (p, v + da - capex - dn)
        })
        .collect();

    let pv_ufcf: LineSeries = ufcf
        .iter()
        .filter(|(p, _)| *p >= first_forecast_year)
        .map(|(p, fcf)| {
            let t = p - first_forecast_year + 1;
            (p, fcf / (1.0 + wacc).powi(t))
        })
        .collect();

    let (_, final_fcf) = ufcf
        .last()
        .ok_or(EngineError::InsufficientHistory { periods: 0, pairs: 0 })?;
    let terminal_value = final_fcf * (1.0 + terminal_growth) / (wacc - terminal_growth);
    let pv_terminal_value = terminal_value / (1.0 + wacc).powi(FORECAST_YEARS as i32);

    Ok(CashFlowForecast {
        ebiat,
        delta_nwc,
        ufcf,
        pv_ufcf,
        terminal_value,
        pv_terminal_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat(periods: std::ops::RangeInclusive<Period>, value: f64) -> LineSeries {
        periods.map(|p| (p, value)).collect()
    }

    fn lines() -> CashFlowLines {
        CashFlowLines {
            ebit: flat(2023..=2028, 100.0),
            depreciation: flat(2023..=2028, 10.0),
            receivables: flat(2023..=2028, 20.0),
            inventory: flat(2023..=2028, 5.0),
            payables: flat(2023..=2028, 8.0),
            capex: flat(2023..=2028, 12.0),
        }
    }

    #[test]
    fn ufcf_build_up_with_flat_nwc() {
        let f = build_cash_flow(&lines(), 2024, 0.21, 0.10, 0.02).unwrap();
        // Flat working capital: every change nets to zero.
        assert!(f.delta_nwc.iter().all(|(_, v)| v == 0.0));
        for (_, v) in f.ufcf.iter() {
            assert_relative_eq!(v, 100.0 * 0.79 + 10.0 - 12.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn first_period_change_in_nwc_is_zero_by_convention() {
        let mut l = lines();
        l.receivables = [(2023, 20.0), (2024, 30.0), (2025, 35.0)].into_iter().collect();
        l.inventory = flat(2023..=2025, 0.0);
        l.payables = flat(2023..=2025, 0.0);
        l.ebit = flat(2023..=2025, 100.0);
        l.depreciation = flat(2023..=2025, 0.0);
        l.capex = flat(2023..=2025, 0.0);
        let f = build_cash_flow(&l, 2024, 0.0, 0.10, 0.02).unwrap();
        assert_relative_eq!(f.ufcf.get(2023).unwrap(), 100.0);
        assert_relative_eq!(f.ufcf.get(2024).unwrap(), 90.0);
        assert_relative_eq!(f.ufcf.get(2025).unwrap(), 95.0);
    }

    #[test]
    fn discounting_starts_at_first_forecast_year() {
        let f = build_cash_flow(&lines(), 2024, 0.21, 0.10, 0.02).unwrap();
        assert_eq!(f.pv_ufcf.get(2023), None);
        let fcf = 100.0 * 0.79 - 2.0;
        for t in 1..=5 {
            let expected = fcf / 1.10_f64.powi(t);
            assert_relative_eq!(
                f.pv_ufcf.get(2023 + t).unwrap(),
                expected,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn terminal_value_perpetuity_and_its_pv() {
        let f = build_cash_flow(&lines(), 2024, 0.21, 0.10, 0.02).unwrap();
        let fcf = 100.0 * 0.79 - 2.0;
        let tv = fcf * 1.02 / 0.08;
        assert_relative_eq!(f.terminal_value, tv, max_relative = 1e-12);
        assert_relative_eq!(
            f.pv_terminal_value,
            tv / 1.10_f64.powi(5),
            max_relative = 1e-12
        );
    }

    #[test]
    fn terminal_growth_at_or_above_wacc_is_rejected() {
        let err = build_cash_flow(&lines(), 2024, 0.21, 0.08, 0.08).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAssumption(_)));
        let err = build_cash_flow(&lines(), 2024, 0.21, 0.08, 0.09).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAssumption(_)));
    }
}
