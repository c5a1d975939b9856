// src/services/mod.rs
pub mod bridge;
pub mod cash_flow;
pub mod cost_of_capital;
pub mod growth;
pub mod margins;
pub mod resolver;
pub mod treasury;
pub mod valuation;
pub mod yahoo;
