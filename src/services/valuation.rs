// src/services/valuation.rs
//! Pipeline orchestrator: runs the six engine stages in their fixed
//! dependency order (resolver -> growth -> margins -> cost of capital ->
//! cash flow -> bridge) and assembles the report the dashboard consumes.

use serde::{Deserialize, Serialize};

use crate::models::{
    CapitalStructure, CompanyProfile, EngineError, LineSeries, StatementTable, UNIT_SCALE,
};
use crate::services::bridge::{bridge_to_share_price, ValuationSummary};
use crate::services::cash_flow::{build_cash_flow, CashFlowLines, DEFAULT_TERMINAL_GROWTH};
use crate::services::cost_of_capital::{estimate_wacc, MarketAssumptions, WaccBreakdown};
use crate::services::growth::project_revenue;
use crate::services::margins::{forecast_from_margin, MarginForecast};
use crate::services::resolver::{extract_line, latest_value, DEFAULT_MATCH_CUTOFF};

// Provider line-item names, resolved fuzzily where filings vary.
const REVENUE: &str = "Total Revenue";
const OPERATING_INCOME: &str = "Operating Income";
const INTEREST_EXPENSE: &str = "Interest Expense";
const DEPRECIATION: &str = "Depreciation And Amortization";
const CAPEX: &str = "Capital Expenditure";
const CASH_AND_EQUIVALENTS: &str = "Cash Cash Equivalents And Short Term Investments";
const RECEIVABLES: &str = "Receivables";
const INVENTORY: &str = "Inventory";
const PAYABLES: &str = "Payables";
const LONG_TERM_DEBT: &str = "Long Term Debt";
const TOTAL_DEBT: &str = "Total Debt";

/// Everything the provider hands over for one ticker.
#[derive(Debug, Clone, Default)]
pub struct CompanyFinancials {
    pub ticker: String,
    pub income_statement: StatementTable,
    pub balance_sheet: StatementTable,
    pub cash_flow: StatementTable,
    pub profile: CompanyProfile,
}

impl CompanyFinancials {
    /// Capital-structure snapshot as of the latest reported period, scaled
    /// to billions. Total debt falls back to zero when no debt line resolves.
    pub fn capital_structure(&self) -> CapitalStructure {
        CapitalStructure {
            market_cap: self.profile.market_cap / UNIT_SCALE,
            total_debt: latest_value(&self.balance_sheet, TOTAL_DEBT, DEFAULT_MATCH_CUTOFF)
                .unwrap_or(0.0),
            beta: self.profile.beta,
            interest_expense: latest_value(
                &self.income_statement,
                INTEREST_EXPENSE,
                DEFAULT_MATCH_CUTOFF,
            ),
            cash: latest_value(&self.balance_sheet, CASH_AND_EQUIVALENTS, DEFAULT_MATCH_CUTOFF)
                .unwrap_or(0.0),
            shares_outstanding: self.profile.shares_outstanding / UNIT_SCALE,
        }
    }
}

/// User-tunable assumptions, applied between stages without recomputing the
/// exposed defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValuationOverrides {
    pub growth_rate: Option<f64>,
    pub ebit_margin: Option<f64>,
    pub wacc: Option<f64>,
    pub terminal_growth: Option<f64>,
}

/// One forecast line of the report: combined historical+projected series and
/// the margin applied (None = metric unavailable, series zero-filled).
#[derive(Debug, Clone, Serialize)]
pub struct ForecastLine {
    pub series: LineSeries,
    pub margin: Option<f64>,
}

impl From<MarginForecast> for ForecastLine {
    fn from(f: MarginForecast) -> Self {
        ForecastLine {
            series: f.combined(),
            margin: f.margin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuationReport {
    pub ticker: String,
    /// Combined historical + projected revenue.
    pub revenue: LineSeries,
    pub avg_growth: Option<f64>,
    pub growth_rate: f64,
    pub ebit: ForecastLine,
    pub depreciation: ForecastLine,
    pub total_cash: ForecastLine,
    pub receivables: ForecastLine,
    pub inventory: ForecastLine,
    pub payables: ForecastLine,
    pub capex: ForecastLine,
    pub wacc: WaccBreakdown,
    /// Discount rate actually applied (override, else the computed WACC).
    pub wacc_applied: f64,
    pub terminal_growth: f64,
    pub ufcf: LineSeries,
    pub pv_ufcf: LineSeries,
    pub summary: ValuationSummary,
}

/// Run a full valuation over already-fetched statements.
pub fn run_valuation(
    financials: &CompanyFinancials,
    risk_free_rate: f64,
    assumptions: &MarketAssumptions,
    overrides: &ValuationOverrides,
) -> Result<ValuationReport, EngineError> {
    let cutoff = DEFAULT_MATCH_CUTOFF;

    let revenue_history = extract_line(&financials.income_statement, REVENUE, cutoff, false)
        .unwrap_or_default();
    let growth = project_revenue(&revenue_history, overrides.growth_rate)?;

    let forecast = |table: &StatementTable, item: &str, magnitude: bool, ovr: Option<f64>| {
        let history = extract_line(table, item, cutoff, magnitude).unwrap_or_default();
        forecast_from_margin(&history, &growth.history, &growth.projection, ovr)
    };

    let ebit = forecast(
        &financials.income_statement,
        OPERATING_INCOME,
        false,
        overrides.ebit_margin,
    );
    let depreciation = forecast(&financials.cash_flow, DEPRECIATION, false, None);
    let total_cash = forecast(&financials.balance_sheet, CASH_AND_EQUIVALENTS, false, None);
    let receivables = forecast(&financials.balance_sheet, RECEIVABLES, false, None);
    let inventory = forecast(&financials.balance_sheet, INVENTORY, false, None);
    let payables = forecast(&financials.balance_sheet, PAYABLES, false, None);
    let capex = forecast(&financials.cash_flow, CAPEX, true, None);

    let capital = financials.capital_structure();
    let wacc_breakdown = estimate_wacc(&capital, risk_free_rate, assumptions);
    let wacc_applied = overrides.wacc.unwrap_or(wacc_breakdown.wacc);
    let terminal_growth = overrides
        .terminal_growth
        .unwrap_or(DEFAULT_TERMINAL_GROWTH);

    let lines = CashFlowLines {
        ebit: ebit.combined(),
        depreciation: depreciation.combined(),
        receivables: receivables.combined(),
        inventory: inventory.combined(),
        payables: payables.combined(),
        capex: capex.combined(),
    };
    let (first_forecast_year, _) = growth
        .projection
        .first()
        .ok_or(EngineError::InsufficientHistory { periods: 0, pairs: 0 })?;
    let cash_flow = build_cash_flow(
        &lines,
        first_forecast_year,
        assumptions.tax_rate,
        wacc_applied,
        terminal_growth,
    )?;

    let debt = latest_value(&financials.balance_sheet, LONG_TERM_DEBT, cutoff);
    let cash = latest_value(&financials.balance_sheet, CASH_AND_EQUIVALENTS, cutoff);
    let summary = bridge_to_share_price(
        &cash_flow.pv_ufcf,
        cash_flow.terminal_value,
        cash_flow.pv_terminal_value,
        debt,
        cash,
        capital.shares_outstanding,
    )?;

    Ok(ValuationReport {
        ticker: financials.ticker.clone(),
        revenue: growth.history.concat(&growth.projection),
        avg_growth: growth.avg_growth,
        growth_rate: growth.growth_rate,
        ebit: ebit.into(),
        depreciation: depreciation.into(),
        total_cash: total_cash.into(),
        receivables: receivables.into(),
        inventory: inventory.into(),
        payables: payables.into(),
        capex: capex.into(),
        wacc: wacc_breakdown,
        wacc_applied,
        terminal_growth,
        ufcf: cash_flow.ufcf,
        pv_ufcf: cash_flow.pv_ufcf,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn year_end(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap()
    }

    fn financials() -> CompanyFinancials {
        let mut income = StatementTable::new();
        let mut balance = StatementTable::new();
        let mut cash_flow = StatementTable::new();
        for (year, revenue) in [(2021, 100.0e9), (2022, 110.0e9), (2023, 121.0e9)] {
            income.insert_point(REVENUE, year_end(year), revenue);
            income.insert_point(OPERATING_INCOME, year_end(year), revenue * 0.2);
            cash_flow.insert_point(DEPRECIATION, year_end(year), revenue * 0.05);
            cash_flow.insert_point(CAPEX, year_end(year), -revenue * 0.05);
            balance.insert_point(RECEIVABLES, year_end(year), revenue * 0.1);
            balance.insert_point(INVENTORY, year_end(year), revenue * 0.02);
            balance.insert_point(PAYABLES, year_end(year), revenue * 0.12);
            balance.insert_point(CASH_AND_EQUIVALENTS, year_end(year), 40.0e9);
            balance.insert_point(LONG_TERM_DEBT, year_end(year), 100.0e9);
            balance.insert_point(TOTAL_DEBT, year_end(year), 110.0e9);
        }
        CompanyFinancials {
            ticker: "TEST".into(),
            income_statement: income,
            balance_sheet: balance,
            cash_flow,
            profile: CompanyProfile {
                market_cap: 2000.0e9,
                beta: 1.2,
                shares_outstanding: 16.0e9,
            },
        }
    }

    #[test]
    fn stages_run_in_order_and_report_is_consistent() {
        let report = run_valuation(
            &financials(),
            0.04,
            &MarketAssumptions::default(),
            &ValuationOverrides::default(),
        )
        .unwrap();

        assert_eq!(report.revenue.len(), 8);
        assert!(report.ebit.margin.is_some());
        assert_eq!(report.pv_ufcf.len(), 5);
        assert!(report.summary.implied_share_price.is_finite());
        // Net debt uses the latest reported levels, scaled to billions.
        assert_eq!(report.summary.net_debt, 60.0);
    }

    #[test]
    fn wacc_override_drives_discounting_without_recompute() {
        let f = financials();
        let defaults = run_valuation(
            &f,
            0.04,
            &MarketAssumptions::default(),
            &ValuationOverrides::default(),
        )
        .unwrap();
        let overridden = run_valuation(
            &f,
            0.04,
            &MarketAssumptions::default(),
            &ValuationOverrides {
                wacc: Some(0.15),
                ..Default::default()
            },
        )
        .unwrap();
        // Computed breakdown unchanged, applied rate replaced.
        assert_eq!(defaults.wacc.wacc, overridden.wacc.wacc);
        assert_eq!(overridden.wacc_applied, 0.15);
        assert!(overridden.summary.enterprise_value < defaults.summary.enterprise_value);
    }

    #[test]
    fn missing_line_items_zero_fill_instead_of_failing() {
        let mut f = financials();
        f.cash_flow = StatementTable::new();
        let report = run_valuation(
            &f,
            0.04,
            &MarketAssumptions::default(),
            &ValuationOverrides::default(),
        )
        .unwrap();
        assert!(report.depreciation.margin.is_none());
        assert!(report.capex.margin.is_none());
        assert!(report.depreciation.series.iter().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn empty_statements_fail_with_insufficient_history() {
        let mut f = financials();
        f.income_statement = StatementTable::new();
        let err = run_valuation(
            &f,
            0.04,
            &MarketAssumptions::default(),
            &ValuationOverrides::default(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::InsufficientHistory { periods: 0, pairs: 0 });
    }
}
