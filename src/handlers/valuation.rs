// src/handlers/valuation.rs
use warp::reply::Json;
use warp::Rejection;
use log::{error, info};

use crate::models::EngineError;
use crate::services::cost_of_capital::MarketAssumptions;
use crate::services::treasury;
use crate::services::valuation::{run_valuation, ValuationOverrides};
use crate::services::yahoo;
use super::error::ApiError;

pub async fn get_valuation(ticker: String, overrides: ValuationOverrides) -> Result<Json, Rejection> {
    info!("Handling valuation request for {}", ticker);

    let financials = yahoo::fetch_company_financials(&ticker).await.map_err(|e| {
        error!("Failed to fetch financials for {}: {}", ticker, e);
        warp::reject::custom(ApiError::external_error(format!(
            "Failed to fetch financial data for {}: {}",
            ticker, e
        )))
    })?;

    let assumptions = MarketAssumptions::default();
    let risk_free_rate =
        treasury::risk_free_rate_or_default(assumptions.fallback_risk_free_rate).await;

    let report = run_valuation(&financials, risk_free_rate, &assumptions, &overrides).map_err(
        |e| match e {
            EngineError::InsufficientHistory { .. } | EngineError::InvalidAssumption(_) => {
                error!("Valuation failed for {}: {}", ticker, e);
                warp::reject::custom(ApiError::invalid_input(e.to_string()))
            }
        },
    )?;

    info!(
        "Valuation complete for {}: implied share price {:.2}",
        ticker, report.summary.implied_share_price
    );
    Ok(warp::reply::json(&report))
}
