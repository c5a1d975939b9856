// src/services/bridge.rs
use serde::Serialize;

use crate::models::{EngineError, LineSeries};

/// Scalar outcome of a valuation run. Monetary figures are in billions;
/// the implied share price is in currency units.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationSummary {
    pub terminal_value: f64,
    pub pv_terminal_value: f64,
    pub enterprise_value: f64,
    pub cash: f64,
    pub debt: f64,
    pub net_debt: f64,
    pub equity_value: f64,
    pub shares_outstanding: f64,
    pub implied_share_price: f64,
}

/// Long-term debt less cash, both from the latest reported balance sheet.
/// Missing figures are treated as zero.
pub fn net_debt(debt: Option<f64>, cash: Option<f64>) -> f64 {
    debt.unwrap_or(0.0) - cash.unwrap_or(0.0)
}

/// Aggregate discounted cash flows into enterprise value and bridge down to
/// an implied per-share price. Non-positive shares outstanding cannot be
/// divided through and are rejected.
pub fn bridge_to_share_price(
    pv_ufcf: &LineSeries,
    terminal_value: f64,
    pv_terminal_value: f64,
    debt: Option<f64>,
    cash: Option<f64>,
    shares_outstanding: f64,
) -> Result<ValuationSummary, EngineError> {
    if !(shares_outstanding > 0.0) {
        return Err(EngineError::InvalidAssumption(format!(
            "shares outstanding must be positive, got {}",
            shares_outstanding
        )));
    }

    let enterprise_value = pv_ufcf.sum() + pv_terminal_value;
    let net_debt_value = net_debt(debt, cash);
    let equity_value = enterprise_value - net_debt_value;

    Ok(ValuationSummary {
        terminal_value,
        pv_terminal_value,
        enterprise_value,
        cash: cash.unwrap_or(0.0),
        debt: debt.unwrap_or(0.0),
        net_debt: net_debt_value,
        equity_value,
        shares_outstanding,
        implied_share_price: equity_value / shares_outstanding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pv_series() -> LineSeries {
        [(2024, 50.0), (2025, 45.0), (2026, 40.0)].into_iter().collect()
    }

    #[test]
    fn enterprise_to_equity_chain() {
        let s = bridge_to_share_price(&pv_series(), 900.0, 600.0, Some(100.0), Some(40.0), 16.0)
            .unwrap();
        assert_relative_eq!(s.enterprise_value, 735.0);
        assert_relative_eq!(s.net_debt, 60.0);
        assert_relative_eq!(s.equity_value, 675.0);
        assert_relative_eq!(s.implied_share_price, 675.0 / 16.0, max_relative = 1e-12);
    }

    #[test]
    fn missing_debt_counts_as_zero() {
        let s = bridge_to_share_price(&pv_series(), 900.0, 600.0, None, Some(40.0), 16.0).unwrap();
        assert_relative_eq!(s.net_debt, -40.0);
        assert_relative_eq!(s.equity_value, 735.0 + 40.0);
    }

    #[test]
    fn zero_shares_is_rejected() {
        let err =
            bridge_to_share_price(&pv_series(), 900.0, 600.0, None, None, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAssumption(_)));
    }

    #[test]
    fn nan_shares_is_rejected() {
        let err = bridge_to_share_price(&pv_series(), 900.0, 600.0, None, None, f64::NAN)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAssumption(_)));
    }
}
