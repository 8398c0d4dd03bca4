//! Skinledger - trade reconciliation for marketplace item trading
//!
//! This library pairs sales with the purchases that produced them, values held
//! inventory at cost, and converts profit into a reporting currency using
//! historical exchange rates.

pub mod config;
pub mod error;
pub mod input;
pub mod matching;
pub mod models;
pub mod rates;
pub mod reports;
pub mod utils;
