// src/bin/test_valuation.rs
use dcf_valuation_backend::services::cost_of_capital::MarketAssumptions;
use dcf_valuation_backend::services::treasury::risk_free_rate_or_default;
use dcf_valuation_backend::services::valuation::{run_valuation, ValuationOverrides};
use dcf_valuation_backend::services::yahoo::fetch_company_financials;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let ticker = std::env::args().nth(1).unwrap_or_else(|| "AAPL".to_string());

    let financials = fetch_company_financials(&ticker).await?;
    let assumptions = MarketAssumptions::default();
    let risk_free_rate = risk_free_rate_or_default(assumptions.fallback_risk_free_rate).await;

    let report = run_valuation(
        &financials,
        risk_free_rate,
        &assumptions,
        &ValuationOverrides::default(),
    )?;

    println!("Ticker:                {}", report.ticker);
    println!("Avg revenue growth:    {:?}", report.avg_growth);
    println!("EBIT margin:           {:?}", report.ebit.margin);
    println!("WACC:                  {:.4}", report.wacc.wacc);
    println!("Cost of equity:        {:.4}", report.wacc.cost_of_equity);
    println!("Cost of debt:          {:.4}", report.wacc.cost_of_debt);
    println!("Risk-free rate:        {:.4}", report.wacc.risk_free_rate);
    println!("Terminal value:        {:.2}B", report.summary.terminal_value);
    println!("PV of terminal value:  {:.2}B", report.summary.pv_terminal_value);
    println!("Enterprise value:      {:.2}B", report.summary.enterprise_value);
    println!("Net debt:              {:.2}B", report.summary.net_debt);
    println!("Equity value:          {:.2}B", report.summary.equity_value);
    println!("Shares outstanding:    {:.2}B", report.summary.shares_outstanding);
    println!("Implied share price:   {:.2}", report.summary.implied_share_price);

    Ok(())
}
