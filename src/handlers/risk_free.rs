// src/handlers/risk_free.rs
use warp::reply::Json;
use warp::Rejection;
use log::info;
use serde_json::json;

use crate::services::cost_of_capital::MarketAssumptions;
use crate::services::treasury;

pub async fn get_risk_free_rate() -> Result<Json, Rejection> {
    info!("Handling request to get the risk-free rate");

    // Fallback is a hard requirement; this endpoint never rejects.
    let fallback = MarketAssumptions::default().fallback_risk_free_rate;
    let rate = treasury::risk_free_rate_or_default(fallback).await;

    Ok(warp::reply::json(&json!({ "rate": rate })))
}
