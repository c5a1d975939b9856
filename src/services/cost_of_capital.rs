// src/services/cost_of_capital.rs
use serde::{Deserialize, Serialize};

use crate::models::CapitalStructure;

/// Named fallback assumptions for the estimator. Deliberate simplifications:
/// the expected market return is pinned at 8% and the effective tax rate at
/// a flat 21%, not derived from live data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAssumptions {
    pub market_return: f64,
    pub tax_rate: f64,
    pub fallback_cost_of_debt: f64,
    pub fallback_risk_free_rate: f64,
}

impl Default for MarketAssumptions {
    fn default() -> Self {
        MarketAssumptions {
            market_return: 0.08,
            tax_rate: 0.21,
            fallback_cost_of_debt: 0.05,
            fallback_risk_free_rate: 0.04,
        }
    }
}

/// WACC and every intermediate CAPM term, reported so the caller can display
/// the defaults and override any of them downstream.
#[derive(Debug, Clone, Serialize)]
pub struct WaccBreakdown {
    pub wacc: f64,
    pub beta: f64,
    pub cost_of_debt: f64,
    pub tax_rate: f64,
    pub risk_free_rate: f64,
    pub market_return: f64,
    pub cost_of_equity: f64,
    pub total_debt: f64,
    pub market_cap: f64,
    pub total_value: f64,
}

/// Blend cost of equity (CAPM) and after-tax cost of debt by market-value
/// weights. With no debt, or a degenerate zero total value, the WACC is the
/// cost of equity.
pub fn estimate_wacc(
    capital: &CapitalStructure,
    risk_free_rate: f64,
    assumptions: &MarketAssumptions,
) -> WaccBreakdown {
    let cost_of_debt = match capital.interest_expense {
        Some(interest) if capital.total_debt > 0.0 => (interest / capital.total_debt).abs(),
        _ => assumptions.fallback_cost_of_debt,
    };

    let cost_of_equity =
        risk_free_rate + capital.beta * (assumptions.market_return - risk_free_rate);

    let total_value = capital.market_cap + capital.total_debt;
    let wacc = if total_value > 0.0 {
        (capital.market_cap / total_value) * cost_of_equity
            + (capital.total_debt / total_value) * cost_of_debt * (1.0 - assumptions.tax_rate)
    } else {
        cost_of_equity
    };

    WaccBreakdown {
        wacc,
        beta: capital.beta,
        cost_of_debt,
        tax_rate: assumptions.tax_rate,
        risk_free_rate,
        market_return: assumptions.market_return,
        cost_of_equity,
        total_debt: capital.total_debt,
        market_cap: capital.market_cap,
        total_value,
    }
}
