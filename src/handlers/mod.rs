// src/handlers/mod.rs
pub mod error;
pub mod risk_free;
pub mod valuation;
