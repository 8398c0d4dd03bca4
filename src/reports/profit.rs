//! Realized profit valued in a single reporting currency.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use super::period::Period;
use crate::matching::transactions::profit_figures;
use crate::matching::Match;
use crate::rates::{lookup, RateResolver, RateTable};

/// Days of rate history requested before the earliest conversion date, so the
/// lookback window is always covered.
pub const RATE_BUFFER_DAYS: i64 = 7;

/// Convert `amount` from `currency` into the currency `tables` are quoted in.
///
/// `None` when no usable rate exists for that day.
pub(crate) fn convert(
    amount: Decimal,
    currency: &str,
    date: NaiveDate,
    reporting_currency: &str,
    tables: &HashMap<String, RateTable>,
) -> Option<Decimal> {
    let currency = currency.trim().to_ascii_uppercase();
    if currency == reporting_currency {
        return Some(amount);
    }
    let rate = lookup(date, tables.get(&currency)?);
    if rate.is_zero() {
        None
    } else {
        Some((amount * rate).round_dp(2))
    }
}

/// Earliest date minus the buffer through the latest date.
pub(crate) fn rate_window(dates: impl IntoIterator<Item = NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    let (min, max) = dates.into_iter().fold(None, |acc, date| match acc {
        None => Some((date, date)),
        Some((lo, hi)) => Some((std::cmp::min(lo, date), std::cmp::max(hi, date))),
    })?;
    Some((min - Duration::days(RATE_BUFFER_DAYS), max))
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuedMatch {
    #[serde(flatten)]
    pub matched: Match,
    pub buy_value: Option<Decimal>,
    pub sell_value: Option<Decimal>,
    pub value_profit: Option<Decimal>,
    pub value_profit_percent: Option<Decimal>,
}

impl ValuedMatch {
    pub fn is_convertible(&self) -> bool {
        self.value_profit.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitReport {
    pub period: Period,
    pub currency: String,
    pub rows: Vec<ValuedMatch>,
    pub total_bought: Decimal,
    pub total_sold: Decimal,
    pub total_profit: Decimal,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub unconvertible_count: usize,
}

impl ProfitReport {
    /// Value every match whose sale falls inside `period`.
    ///
    /// Buy prices convert at the buy's effective date and sell prices at the
    /// sale's. Rows with a missing rate on either side keep `None` values and
    /// are left out of the totals.
    pub async fn build(
        resolver: &RateResolver,
        matches: &[Match],
        reporting_currency: &str,
        period: Period,
    ) -> Self {
        let currency = reporting_currency.trim().to_ascii_uppercase();
        let in_period: Vec<&Match> = matches
            .iter()
            .filter(|m| period.contains_instant(m.sell_date()))
            .collect();

        let dates = in_period.iter().flat_map(|m| {
            std::iter::once(m.sell_date().date_naive()).chain(m.buy_date().map(|d| d.date_naive()))
        });
        let tables = match rate_window(dates) {
            Some((start, end)) => {
                let currencies: Vec<String> = in_period
                    .iter()
                    .flat_map(|m| [m.sell.currency.clone(), m.buy_currency().to_string()])
                    .collect();
                resolver.resolve_bulk(&currencies, &currency, start, end).await
            }
            None => HashMap::new(),
        };

        let rows: Vec<ValuedMatch> = in_period
            .into_iter()
            .map(|m| value_match(m, &currency, &tables))
            .collect();

        let mut report = ProfitReport {
            period,
            currency,
            rows: Vec::new(),
            total_bought: Decimal::ZERO,
            total_sold: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            matched_count: 0,
            unmatched_count: 0,
            unconvertible_count: 0,
        };
        for row in &rows {
            if row.matched.is_matched() {
                report.matched_count += 1;
            } else {
                report.unmatched_count += 1;
            }
            match (row.buy_value, row.sell_value, row.value_profit) {
                (Some(buy), Some(sell), Some(profit)) => {
                    report.total_bought += buy;
                    report.total_sold += sell;
                    report.total_profit += profit;
                }
                _ => report.unconvertible_count += 1,
            }
        }
        report.rows = rows;

        if report.unconvertible_count > 0 {
            warn!(
                "{} sales could not be converted to {} and are excluded from totals",
                report.unconvertible_count, report.currency
            );
        }
        info!(
            "Profit report {}: {} sales, total profit {} {}",
            report.period,
            report.rows.len(),
            report.total_profit,
            report.currency
        );
        report
    }
}

fn value_match(m: &Match, currency: &str, tables: &HashMap<String, RateTable>) -> ValuedMatch {
    let sell_value = convert(
        m.sell.price,
        &m.sell.currency,
        m.sell_date().date_naive(),
        currency,
        tables,
    );
    let buy_value = match (&m.buy, m.buy_date()) {
        (Some(buy), Some(date)) => convert(buy.price, &buy.currency, date.date_naive(), currency, tables),
        _ => Some(Decimal::ZERO),
    };

    let (value_profit, value_profit_percent) = match (sell_value, buy_value) {
        (Some(sell), Some(buy)) => {
            let (profit, percent) = profit_figures(sell, buy);
            (Some(profit), Some(percent))
        }
        _ => (None, None),
    };

    ValuedMatch {
        matched: m.clone(),
        buy_value,
        sell_value,
        value_profit,
        value_profit_percent,
    }
}
