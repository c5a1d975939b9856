// src/routes.rs
use crate::handlers::{risk_free::get_risk_free_rate, valuation::get_valuation};
use log::info;

use std::convert::Infallible;
use warp::{Filter, Reply};
use warp::reject::Rejection;
use crate::handlers::error::{ApiError, ApiErrorKind};

// Add recovery handling for our custom errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = match api_error.kind {
            ApiErrorKind::InvalidInput => warp::http::StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorKind::External => warp::http::StatusCode::BAD_GATEWAY,
        };
        message = api_error.message.clone();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes() -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let valuation_route = warp::path!("api" / "v1" / "valuation" / String)
        .and(warp::get())
        .and(warp::query())
        .and_then(get_valuation);

    let risk_free_route = warp::path!("api" / "v1" / "risk_free_rate")
        .and(warp::get())
        .and_then(get_risk_free_rate);

    info!("All routes configured successfully.");

    valuation_route
        .or(risk_free_route)
        .recover(handle_rejection)
}
