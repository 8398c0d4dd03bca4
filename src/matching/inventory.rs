use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use super::signature::Signature;
use crate::models::{InventoryItem, Transaction};

/// Held item with the cost basis of the purchase that most likely produced it
#[derive(Debug, Clone, Serialize)]
pub struct ValuedInventoryItem {
    pub item: InventoryItem,
    pub signature: Signature,
    pub buy_source: String,
    pub buy_date: Option<DateTime<Utc>>,
    pub buy_price: Decimal,
    pub buy_currency: String,
    pub is_matched: bool,
}

impl ValuedInventoryItem {
    fn unmatched(item: &InventoryItem, signature: Signature) -> Self {
        Self {
            item: item.clone(),
            signature,
            buy_source: "Unknown".to_string(),
            buy_date: None,
            buy_price: Decimal::ZERO,
            buy_currency: "USD".to_string(),
            is_matched: false,
        }
    }

    fn matched(item: &InventoryItem, signature: Signature, buy: &Transaction) -> Self {
        Self {
            item: item.clone(),
            signature,
            buy_source: buy.source.clone(),
            buy_date: Some(buy.effective_date()),
            buy_price: buy.price,
            buy_currency: buy.currency.clone(),
            is_matched: true,
        }
    }
}

/// Keep the newest buy per key. Ties keep the first one seen.
fn keep_newest<'a, K: std::hash::Hash + Eq>(
    index: &mut HashMap<K, &'a Transaction>,
    key: K,
    buy: &'a Transaction,
) {
    index
        .entry(key)
        .and_modify(|current| {
            if buy.effective_date() > current.effective_date() {
                *current = buy;
            }
        })
        .or_insert(buy);
}

/// Establish a cost basis for every held item.
///
/// Identifier match on (source, asset id) first, then signature match. There is
/// no date constraint and buys are not consumed, so several items may point at
/// the same purchase.
pub fn match_inventory(
    inventory: &[InventoryItem],
    buys: &[Transaction],
) -> Vec<ValuedInventoryItem> {
    let mut by_signature: HashMap<Signature, &Transaction> = HashMap::new();
    let mut by_asset: HashMap<(&str, &str), &Transaction> = HashMap::new();

    for buy in buys {
        keep_newest(&mut by_signature, Signature::from(buy), buy);
        if let Some(asset_id) = buy.asset_id() {
            keep_newest(&mut by_asset, (buy.source.as_str(), asset_id), buy);
        }
    }

    inventory
        .iter()
        .map(|item| {
            let sig = Signature::from(item);
            let by_id = item
                .asset_id()
                .and_then(|asset_id| by_asset.get(&(item.source.as_str(), asset_id)));
            match by_id.or_else(|| by_signature.get(&sig)) {
                Some(buy) => ValuedInventoryItem::matched(item, sig, buy),
                None => ValuedInventoryItem::unmatched(item, sig),
            }
        })
        .collect()
}
