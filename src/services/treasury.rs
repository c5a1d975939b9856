// src/services/treasury.rs
use chrono::{Datelike, Utc};
use csv::Reader;
use log::{error, info, warn};
use reqwest;

use crate::BoxError;

pub type Result<T> = std::result::Result<T, BoxError>;

/// Fetch the latest 10-year Treasury par yield via the CSV endpoint,
/// as a decimal rate.
pub async fn fetch_risk_free_rate() -> Result<f64> {
    let year = Utc::now().year();
    let url = format!(
        "https://home.treasury.gov/resource-center/data-chart-center/interest-rates/\
daily-treasury-rates.csv/{year}/all?_format=csv\
&field_tdr_date_value={year}\
&type=daily_treasury_yield_curve",
        year = year
    );
    info!("Fetching Treasury yield CSV from URL: {}", url);

    // Download & parse
    let csv_text = reqwest::get(&url).await?.text().await?;
    let mut rdr = Reader::from_reader(csv_text.as_bytes());

    // Locate the "10 Yr" column
    let headers = rdr.headers()?.clone();
    let idx_10y = headers
        .iter()
        .position(|h| h.trim() == "10 Yr")
        .ok_or("No '10 Yr' column in Treasury yield CSV")?;

    // Take the first data row (most recent date)
    if let Some(record) = rdr.records().next() {
        let row = record?;
        let cell = row
            .get(idx_10y)
            .ok_or("Missing '10 Yr' field")?
            .trim();
        let rate = cell.parse::<f64>()? / 100.0;
        info!("Found 10-year Treasury yield: {}", rate);
        return Ok(rate);
    }

    error!("No data rows in Treasury yield CSV");
    Err("No valid Treasury yield data found".into())
}

/// Risk-free rate with the hard fallback applied: the rest of the pipeline
/// cannot proceed without a rate, so any retrieval failure resolves to the
/// configured default.
pub async fn risk_free_rate_or_default(fallback: f64) -> f64 {
    match fetch_risk_free_rate().await {
        Ok(rate) => rate,
        Err(e) => {
            warn!("Risk-free rate fetch failed ({}); using default {}", e, fallback);
            fallback
        }
    }
}
