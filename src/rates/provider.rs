//! Upstream exchange-rate provider abstractions.
//!
//! Providers speak different JSON dialects. Each one decodes its response into
//! a [`RatePayload`] at the boundary, and the resolver turns payloads into
//! canonical [`RateTable`]s.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::table::RateTable;

/// Longest range the bilateral provider accepts in one request, in days.
pub const DEFAULT_MAX_SPAN_DAYS: i64 = 365;

/// Failures talking to a rate provider.
///
/// None of these escape the resolver: every variant degrades to an empty table.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("network error from {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("{provider} returned error status: {status}")]
    Status { provider: String, status: u16 },

    #[error("malformed response from {provider}: {message}")]
    Malformed { provider: String, message: String },

    #[error("{provider} does not quote {currency}")]
    Unsupported { provider: String, currency: String },
}

/// One published rate
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: String,
    pub value: f64,
}

/// Provider response decoded into one of the two known shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RatePayload {
    /// Flat `[{date, value}]` list for a single pair.
    Series(Vec<Observation>),
    /// `{date: {symbol: value}}` grid, possibly holding several symbols.
    Grid(BTreeMap<String, HashMap<String, f64>>),
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn to_rate(value: f64) -> Option<Decimal> {
    if value.is_finite() && value > 0.0 {
        // via Display so 3.9432 does not pick up binary noise
        value.to_string().parse::<Decimal>().ok()
    } else {
        None
    }
}

impl RatePayload {
    /// Canonical table for `symbol`. Series payloads hold a single pair, so the
    /// symbol is only consulted for grids. Unparseable dates and non-positive
    /// values are skipped.
    pub fn into_table(self, symbol: &str) -> RateTable {
        match self {
            RatePayload::Series(observations) => observations
                .into_iter()
                .filter_map(|o| Some((parse_day(&o.date)?, to_rate(o.value)?)))
                .collect(),
            RatePayload::Grid(grid) => grid
                .into_iter()
                .filter_map(|(date, values)| {
                    let value = values.get(symbol).copied()?;
                    Some((parse_day(&date)?, to_rate(value)?))
                })
                .collect(),
        }
    }

    /// One table per requested symbol; missing symbols get an empty table.
    pub fn into_tables(self, symbols: &[String]) -> HashMap<String, RateTable> {
        match self {
            RatePayload::Series(observations) => match symbols {
                [only] => HashMap::from([(
                    only.clone(),
                    RatePayload::Series(observations).into_table(only),
                )]),
                _ => HashMap::new(),
            },
            RatePayload::Grid(grid) => {
                let mut tables: HashMap<String, RateTable> = symbols
                    .iter()
                    .map(|s| (s.clone(), RateTable::new()))
                    .collect();
                for (raw_date, values) in grid {
                    let Some(date) = parse_day(&raw_date) else {
                        continue;
                    };
                    for (symbol, value) in values {
                        if let (Some(table), Some(rate)) = (tables.get_mut(&symbol), to_rate(value)) {
                            table.insert(date, rate);
                        }
                    }
                }
                tables
            }
        }
    }
}

/// Provider quoting every currency against one fixed target, with a capped
/// request range.
#[async_trait]
pub trait BilateralRateProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Currency every quote is expressed in.
    fn target(&self) -> &str;

    /// Longest range one request may cover, in days (inclusive).
    fn max_span_days(&self) -> i64 {
        DEFAULT_MAX_SPAN_DAYS
    }

    /// Rates of `currency` in units of [`target`](Self::target) for
    /// `start..=end`. The range never exceeds `max_span_days`.
    async fn fetch(
        &self,
        currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RatePayload, RateError>;
}

/// Provider supporting arbitrary base/target pairs and multi-symbol queries.
#[async_trait]
pub trait CrossRateProvider: Send + Sync {
    fn id(&self) -> &'static str;

    fn supports(&self, currency: &str) -> bool;

    /// Rates of every symbol in units per one `base`, for `start..=end`.
    async fn fetch(
        &self,
        base: &str,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RatePayload, RateError>;
}

/// Split `start..=end` into consecutive, disjoint chunks of at most
/// `max_span_days` days each. The last chunk ends exactly on `end`.
pub fn split_range(start: NaiveDate, end: NaiveDate, max_span_days: i64) -> Vec<(NaiveDate, NaiveDate)> {
    let span = Duration::days(max_span_days.max(1) - 1);
    let mut chunks = Vec::new();
    let mut chunk_start = start;
    while chunk_start <= end {
        let chunk_end = (chunk_start + span).min(end);
        chunks.push((chunk_start, chunk_end));
        chunk_start = chunk_end + Duration::days(1);
    }
    chunks
}
