//! Normalized trade records produced by the marketplace collectors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Pattern index used by collectors when an item has no pattern.
pub const NO_PATTERN: i32 = -1;

/// Transaction type (buy or sell)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "B" => Ok(TransactionType::Buy),
            "SELL" | "S" => Ok(TransactionType::Sell),
            _ => Err(()),
        }
    }
}

fn default_pattern() -> i32 {
    NO_PATTERN
}

fn default_currency() -> String {
    "USD".to_string()
}

/// A single buy or sell on one marketplace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub source: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub tx_id: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    pub item_name: String,
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "float_value")]
    pub float_val: f64,
    #[serde(default = "default_pattern")]
    pub pattern: i32,
    #[serde(default)]
    pub phase: String,
}

impl Transaction {
    /// Timestamp used for every temporal comparison: verification time when the
    /// trade has cleared, creation time otherwise.
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.verified_at.unwrap_or(self.created_at)
    }

    /// True when the record carries wear or pattern metadata.
    pub fn has_metadata(&self) -> bool {
        self.float_val > 0.0 || self.pattern != NO_PATTERN
    }

    /// Asset id, ignoring blanks some collectors emit instead of null.
    pub fn asset_id(&self) -> Option<&str> {
        self.asset_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn is_buy(&self) -> bool {
        self.transaction_type == TransactionType::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.transaction_type == TransactionType::Sell
    }
}

/// Split a mixed collector dump into (sales, buys), preserving input order.
pub fn partition_by_type(transactions: &[Transaction]) -> (Vec<Transaction>, Vec<Transaction>) {
    transactions.iter().cloned().partition(Transaction::is_sell)
}

/// A currently held, unsold unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub source: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    pub item_name: String,
    #[serde(default, alias = "float_value")]
    pub float_val: f64,
    #[serde(default = "default_pattern")]
    pub pattern: i32,
    #[serde(default = "default_tradable")]
    pub is_tradable: bool,
}

fn default_tradable() -> bool {
    true
}

impl InventoryItem {
    pub fn asset_id(&self) -> Option<&str> {
        self.asset_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
