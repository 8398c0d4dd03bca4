//! Loading collector dumps from disk.
//!
//! Transactions and inventory come either as a JSON array of records or as a
//! CSV file whose header row uses the same field names.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::LedgerError;
use crate::models::{InventoryItem, Transaction};

/// Format of an input file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    pub fn detect(path: &Path) -> Result<Self, LedgerError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                LedgerError::Input(format!("{} has no file extension", path.display()))
            })?;

        match extension.as_str() {
            "json" => Ok(InputFormat::Json),
            "csv" => Ok(InputFormat::Csv),
            other => Err(LedgerError::Input(format!(
                "unsupported input format '.{}' (expected .json or .csv)",
                other
            ))),
        }
    }
}

fn parse_json<T: DeserializeOwned>(content: &str) -> Result<Vec<T>, LedgerError> {
    serde_json::from_str(content).map_err(|e| LedgerError::Input(e.to_string()))
}

fn parse_csv<T: DeserializeOwned>(content: &str) -> Result<Vec<T>, LedgerError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            // header is line 1
            row.map_err(|e| LedgerError::Input(format!("line {}: {}", i + 2, e)))
        })
        .collect()
}

/// Read every record from a JSON or CSV file.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let format = InputFormat::detect(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let records = match format {
        InputFormat::Json => parse_json(&content),
        InputFormat::Csv => parse_csv(&content),
    }
    .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(records)
}

pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let transactions: Vec<Transaction> = load_records(path)?;
    info!(
        "Loaded {} transactions from {}",
        transactions.len(),
        path.display()
    );
    Ok(transactions)
}

pub fn load_inventory(path: &Path) -> Result<Vec<InventoryItem>> {
    let items: Vec<InventoryItem> = load_records(path)?;
    info!("Loaded {} inventory items from {}", items.len(), path.display());
    Ok(items)
}
