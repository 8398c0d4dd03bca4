//! Buys and sales for a period, priced in a pivot and a target currency.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::period::Period;
use super::profit::{convert, rate_window};
use crate::models::Transaction;
use crate::rates::{lookup, RateResolver};

#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub date: NaiveDate,
    pub pivot_amount: Option<Decimal>,
    pub target_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeLedger {
    pub period: Period,
    pub pivot_currency: String,
    pub target_currency: String,
    pub buys: Vec<LedgerRow>,
    pub sales: Vec<LedgerRow>,
    pub total_spent: Decimal,
    pub total_income: Decimal,
    pub unconvertible_count: usize,
}

impl TradeLedger {
    /// Every transaction in `period`, first into `pivot` at its own date and
    /// then from `pivot` into `target` at the same date.
    pub async fn build(
        resolver: &RateResolver,
        transactions: &[Transaction],
        period: Period,
        pivot: &str,
        target: &str,
    ) -> Self {
        let pivot = pivot.trim().to_ascii_uppercase();
        let target = target.trim().to_ascii_uppercase();

        let mut in_period: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| period.contains_instant(t.effective_date()))
            .collect();
        in_period.sort_by_key(|t| t.effective_date());

        let (tables, pivot_to_target) =
            match rate_window(in_period.iter().map(|t| t.effective_date().date_naive())) {
                Some((start, end)) => {
                    let currencies: Vec<String> =
                        in_period.iter().map(|t| t.currency.clone()).collect();
                    let (tables, pivot_to_target) = futures::join!(
                        resolver.resolve_bulk(&currencies, &pivot, start, end),
                        resolver.resolve(&pivot, &target, start, end)
                    );
                    (tables, pivot_to_target)
                }
                None => Default::default(),
            };

        let mut ledger = TradeLedger {
            period,
            pivot_currency: pivot.clone(),
            target_currency: target.clone(),
            buys: Vec::new(),
            sales: Vec::new(),
            total_spent: Decimal::ZERO,
            total_income: Decimal::ZERO,
            unconvertible_count: 0,
        };

        for t in in_period {
            let date = t.effective_date().date_naive();
            let pivot_amount = convert(t.price, &t.currency, date, &pivot, &tables);
            let target_amount = pivot_amount.and_then(|amount| {
                if pivot == target {
                    return Some(amount);
                }
                let rate = lookup(date, &pivot_to_target);
                (!rate.is_zero()).then(|| (amount * rate).round_dp(2))
            });

            match target_amount {
                Some(amount) if t.is_buy() => ledger.total_spent += amount,
                Some(amount) => ledger.total_income += amount,
                None => ledger.unconvertible_count += 1,
            }

            let row = LedgerRow {
                transaction: t.clone(),
                date,
                pivot_amount,
                target_amount,
            };
            if t.is_buy() {
                ledger.buys.push(row);
            } else {
                ledger.sales.push(row);
            }
        }

        info!(
            "Ledger {}: {} buys, {} sales, spent {} / income {} {}",
            ledger.period,
            ledger.buys.len(),
            ledger.sales.len(),
            ledger.total_spent,
            ledger.total_income,
            ledger.target_currency
        );
        ledger
    }
}
