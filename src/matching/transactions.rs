use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use super::signature::Signature;
use crate::models::Transaction;

/// Marketplace whose asset ids survive a buy-then-sell cycle.
pub const DEFAULT_STABLE_ASSET_SOURCE: &str = "DMarket";

/// How a sale was paired with its purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Meta,
    AssetId,
    None,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Meta => "meta",
            MatchType::AssetId => "asset_id",
            MatchType::None => "none",
        }
    }
}

/// Result of reconciling one sale
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub sell: Transaction,
    pub buy: Option<Transaction>,
    /// Position of the matched buy in the input slice
    pub buy_index: Option<usize>,
    pub match_type: MatchType,
    pub signature: Signature,
    pub profit: Decimal,
    pub profit_percent: Decimal,
}

impl Match {
    pub fn item_name(&self) -> &str {
        &self.sell.item_name
    }

    pub fn float_val(&self) -> f64 {
        self.sell.float_val
    }

    pub fn pattern(&self) -> i32 {
        self.sell.pattern
    }

    pub fn phase(&self) -> &str {
        &self.sell.phase
    }

    pub fn is_matched(&self) -> bool {
        self.buy.is_some()
    }

    pub fn buy_price(&self) -> Decimal {
        self.buy.as_ref().map(|b| b.price).unwrap_or(Decimal::ZERO)
    }

    pub fn buy_currency(&self) -> &str {
        self.buy.as_ref().map(|b| b.currency.as_str()).unwrap_or("USD")
    }

    pub fn buy_source(&self) -> &str {
        self.buy.as_ref().map(|b| b.source.as_str()).unwrap_or("N/A")
    }

    pub fn buy_date(&self) -> Option<DateTime<Utc>> {
        self.buy.as_ref().map(Transaction::effective_date)
    }

    pub fn sell_date(&self) -> DateTime<Utc> {
        self.sell.effective_date()
    }
}

/// Profit and profit percent, both rounded to cents.
pub(crate) fn profit_figures(sell_price: Decimal, buy_price: Decimal) -> (Decimal, Decimal) {
    let profit = sell_price - buy_price;
    let percent = if buy_price > Decimal::ZERO {
        profit / buy_price * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    (profit.round_dp(2), percent.round_dp(2))
}

/// Buy records plus consumption state for a single reconciliation run.
///
/// Buckets hold indices into `buys`, newest effective date first.
struct BuyArena<'a> {
    buys: &'a [Transaction],
    consumed: Vec<bool>,
    by_signature: HashMap<Signature, Vec<usize>>,
    by_asset: HashMap<(String, String), Vec<usize>>,
}

impl<'a> BuyArena<'a> {
    fn new(buys: &'a [Transaction], stable_source: &str) -> Self {
        let mut by_signature: HashMap<Signature, Vec<usize>> = HashMap::new();
        let mut by_asset: HashMap<(String, String), Vec<usize>> = HashMap::new();

        for (idx, buy) in buys.iter().enumerate() {
            by_signature.entry(Signature::from(buy)).or_default().push(idx);
            if buy.source == stable_source {
                if let Some(asset_id) = buy.asset_id() {
                    by_asset
                        .entry((buy.source.clone(), asset_id.to_string()))
                        .or_default()
                        .push(idx);
                }
            }
        }

        // Stable sort keeps input order among equal dates.
        let newest_first = |a: &usize, b: &usize| {
            buys[*b].effective_date().cmp(&buys[*a].effective_date())
        };
        by_signature
            .values_mut()
            .for_each(|bucket| bucket.sort_by(newest_first));
        by_asset
            .values_mut()
            .for_each(|bucket| bucket.sort_by(newest_first));

        Self {
            consumed: vec![false; buys.len()],
            buys,
            by_signature,
            by_asset,
        }
    }

    /// Position within `bucket` of the newest unconsumed buy not later than `sold_at`.
    fn newest_eligible(&self, bucket: &[usize], sold_at: DateTime<Utc>) -> Option<usize> {
        bucket
            .iter()
            .position(|&idx| !self.consumed[idx] && self.buys[idx].effective_date() <= sold_at)
    }

    fn take_by_signature(&mut self, signature: &Signature, sold_at: DateTime<Utc>) -> Option<usize> {
        let pos = {
            let bucket = self.by_signature.get(signature)?;
            self.newest_eligible(bucket, sold_at)?
        };
        let bucket = self.by_signature.get_mut(signature)?;
        let idx = bucket.remove(pos);
        self.consume(idx);
        Some(idx)
    }

    fn take_by_asset(&mut self, source: &str, asset_id: &str, sold_at: DateTime<Utc>) -> Option<usize> {
        let key = (source.to_string(), asset_id.to_string());
        let pos = {
            let bucket = self.by_asset.get(&key)?;
            self.newest_eligible(bucket, sold_at)?
        };
        let bucket = self.by_asset.get_mut(&key)?;
        let idx = bucket.remove(pos);
        self.consume(idx);
        Some(idx)
    }

    /// Flag a buy as used and drop it from the signature index.
    fn consume(&mut self, idx: usize) {
        self.consumed[idx] = true;
        let signature = Signature::from(&self.buys[idx]);
        if let Some(bucket) = self.by_signature.get_mut(&signature) {
            bucket.retain(|&other| other != idx);
        }
    }
}

/// Greedy sale-to-purchase matcher.
#[derive(Debug, Clone)]
pub struct Reconciler {
    stable_asset_source: String,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_STABLE_ASSET_SOURCE)
    }
}

impl Reconciler {
    pub fn new(stable_asset_source: impl Into<String>) -> Self {
        Self {
            stable_asset_source: stable_asset_source.into(),
        }
    }

    pub fn stable_asset_source(&self) -> &str {
        &self.stable_asset_source
    }

    /// Pair every sale with at most one purchase.
    ///
    /// Returns exactly one [`Match`] per sale, in the order of `sales`. Each
    /// buy is used at most once, and never for a sale that happened before it.
    pub fn match_transactions(&self, sales: &[Transaction], buys: &[Transaction]) -> Vec<Match> {
        let mut arena = BuyArena::new(buys, &self.stable_asset_source);
        let mut matches = Vec::with_capacity(sales.len());

        for sale in sales {
            let sold_at = sale.effective_date();
            let sig = Signature::from(sale);

            let mut matched = None;
            if sale.has_metadata() {
                matched = arena
                    .take_by_signature(&sig, sold_at)
                    .map(|idx| (idx, MatchType::Meta));
            }

            if matched.is_none() && sale.source == self.stable_asset_source {
                if let Some(asset_id) = sale.asset_id() {
                    matched = arena
                        .take_by_asset(&sale.source, asset_id, sold_at)
                        .map(|idx| (idx, MatchType::AssetId));
                }
            }

            let (buy_index, match_type) = match matched {
                Some((idx, kind)) => (Some(idx), kind),
                None => (None, MatchType::None),
            };
            let buy = buy_index.map(|idx| buys[idx].clone());
            let buy_price = buy.as_ref().map(|b| b.price).unwrap_or(Decimal::ZERO);
            let (profit, profit_percent) = profit_figures(sale.price, buy_price);

            debug!(
                "Sale {} ({}) -> {}",
                sale.tx_id,
                sig,
                match_type.as_str()
            );

            matches.push(Match {
                sell: sale.clone(),
                buy,
                buy_index,
                match_type,
                signature: sig,
                profit,
                profit_percent,
            });
        }

        let matched = matches.iter().filter(|m| m.is_matched()).count();
        info!(
            "Reconciled {} sales against {} buys: {} matched, {} unmatched",
            sales.len(),
            buys.len(),
            matched,
            sales.len() - matched
        );

        matches
    }
}

/// Reconcile with the default identifier-stable marketplace.
pub fn match_transactions(sales: &[Transaction], buys: &[Transaction]) -> Vec<Match> {
    Reconciler::default().match_transactions(sales, buys)
}
