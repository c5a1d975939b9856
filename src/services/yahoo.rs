// src/services/yahoo.rs
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{CompanyProfile, StatementTable};
use crate::services::valuation::CompanyFinancials;
use crate::BoxError;

pub type Result<T> = std::result::Result<T, BoxError>;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// Annual fundamentals requested per statement from the timeseries endpoint.
const INCOME_TYPES: &[&str] = &[
    "annualTotalRevenue",
    "annualOperatingIncome",
    "annualInterestExpense",
];
const BALANCE_TYPES: &[&str] = &[
    "annualCashCashEquivalentsAndShortTermInvestments",
    "annualLongTermDebt",
    "annualReceivables",
    "annualInventory",
    "annualPayables",
    "annualTotalDebt",
];
const CASH_FLOW_TYPES: &[&str] = &[
    "annualDepreciationAndAmortization",
    "annualCapitalExpenditure",
];

/// History window requested from the timeseries endpoint, in years.
const HISTORY_YEARS: i64 = 5;

// `timeseries` schema
#[derive(Deserialize, Debug)]
struct TimeseriesEnvelope {
    timeseries: TimeseriesBody,
}

#[derive(Deserialize, Debug)]
struct TimeseriesBody {
    result: Option<Vec<TimeseriesResult>>,
}

#[derive(Deserialize, Debug)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    // Row payloads are keyed by the requested type name; anything else in
    // the object (timestamps etc.) is decoded lazily and skipped.
    #[serde(flatten)]
    rows: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct TimeseriesMeta {
    #[serde(rename = "type")]
    types: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TimeseriesPoint {
    #[serde(rename = "asOfDate")]
    as_of_date: String,
    #[serde(rename = "reportedValue")]
    reported_value: ReportedValue,
}

#[derive(Deserialize, Debug)]
struct ReportedValue {
    raw: f64,
}

// `quoteSummary` schema
#[derive(Deserialize, Debug)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryBody {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    #[serde(rename = "summaryDetail")]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(rename = "defaultKeyStatistics")]
    key_statistics: Option<KeyStatisticsModule>,
}

#[derive(Deserialize, Debug)]
struct PriceModule {
    #[serde(rename = "marketCap")]
    market_cap: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct SummaryDetailModule {
    beta: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct KeyStatisticsModule {
    #[serde(rename = "sharesOutstanding")]
    shares_outstanding: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct RawValue {
    raw: Option<f64>,
}

/// Provider type name to statement line-item name: strip the "annual"
/// prefix and break the camel case into words, e.g. "annualTotalRevenue"
/// becomes "Total Revenue".
fn line_name(ts_type: &str) -> String {
    let stripped = ts_type.strip_prefix("annual").unwrap_or(ts_type);
    let mut name = String::with_capacity(stripped.len() + 8);
    for (i, c) in stripped.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            name.push(' ');
        }
        name.push(c);
    }
    name
}

fn build_client() -> Result<Client> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

async fn fetch_timeseries(client: &Client, ticker: &str, types: &[&str]) -> Result<StatementTable> {
    let period2 = Utc::now().timestamp();
    let period1 = period2 - HISTORY_YEARS * 366 * 24 * 60 * 60;
    let url = format!(
        "https://query1.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries/\
{ticker}?symbol={ticker}&type={types}&period1={period1}&period2={period2}",
        ticker = ticker,
        types = types.join(","),
        period1 = period1,
        period2 = period2
    );
    info!("Fetching fundamentals timeseries from URL: {}", url);

    let envelope: TimeseriesEnvelope = client.get(&url).send().await?.json().await?;
    let mut table = StatementTable::new();

    let results = match envelope.timeseries.result {
        Some(results) => results,
        None => {
            warn!("[{}] empty timeseries result; statement will be empty", ticker);
            return Ok(table);
        }
    };

    for result in results {
        for ts_type in &result.meta.types {
            let Some(raw_rows) = result.rows.get(ts_type) else {
                warn!("[{}] no rows for {}", ticker, ts_type);
                continue;
            };
            let points: Vec<Option<TimeseriesPoint>> =
                match serde_json::from_value(raw_rows.clone()) {
                    Ok(points) => points,
                    Err(e) => {
                        warn!("[{}] failed to decode {} rows: {}", ticker, ts_type, e);
                        continue;
                    }
                };
            let name = line_name(ts_type);
            for point in points.into_iter().flatten() {
                match NaiveDate::parse_from_str(&point.as_of_date, "%Y-%m-%d") {
                    Ok(date) => table.insert_point(&name, date, point.reported_value.raw),
                    Err(e) => warn!(
                        "[{}] bad asOfDate '{}' for {}: {}",
                        ticker, point.as_of_date, ts_type, e
                    ),
                }
            }
        }
    }

    Ok(table)
}

async fn fetch_profile(client: &Client, ticker: &str) -> Result<CompanyProfile> {
    let url = format!(
        "https://query1.finance.yahoo.com/v10/finance/quoteSummary/{ticker}\
?modules=price,summaryDetail,defaultKeyStatistics",
        ticker = ticker
    );
    info!("Fetching company profile from URL: {}", url);

    let envelope: QuoteSummaryEnvelope = client.get(&url).send().await?.json().await?;
    let result = envelope
        .quote_summary
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or("Empty quoteSummary result")?;

    let market_cap = result
        .price
        .and_then(|p| p.market_cap)
        .and_then(|v| v.raw)
        .unwrap_or(0.0);
    // Missing beta defaults to 1 (market beta).
    let beta = result
        .summary_detail
        .and_then(|s| s.beta)
        .and_then(|v| v.raw)
        .unwrap_or(1.0);
    let shares_outstanding = result
        .key_statistics
        .and_then(|k| k.shares_outstanding)
        .and_then(|v| v.raw)
        .unwrap_or(0.0);

    Ok(CompanyProfile {
        market_cap,
        beta,
        shares_outstanding,
    })
}

/// Fetch the three statements and the company-info record for one ticker.
pub async fn fetch_company_financials(ticker: &str) -> Result<CompanyFinancials> {
    let client = build_client()?;

    let income_statement = fetch_timeseries(&client, ticker, INCOME_TYPES).await?;
    let balance_sheet = fetch_timeseries(&client, ticker, BALANCE_TYPES).await?;
    let cash_flow = fetch_timeseries(&client, ticker, CASH_FLOW_TYPES).await?;
    let profile = fetch_profile(&client, ticker).await?;

    Ok(CompanyFinancials {
        ticker: ticker.to_string(),
        income_statement,
        balance_sheet,
        cash_flow,
        profile,
    })
}
