//! Historical exchange rates.
//!
//! [`RateResolver`] turns "rates of FROM in TO over a date range" into a
//! [`RateTable`], routing each pair to the right upstream provider, applying
//! currency pegs, splitting long bilateral ranges and caching every successful
//! result for the life of the process.

pub mod cache;
pub mod frankfurter;
pub mod nbp;
pub mod provider;
pub mod table;

use anyhow::Result;
use chrono::NaiveDate;
use futures::future::join_all;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use cache::{RateCache, RateKey};
pub use frankfurter::FrankfurterProvider;
pub use nbp::NbpProvider;
pub use provider::{
    split_range, BilateralRateProvider, CrossRateProvider, Observation, RateError, RatePayload,
};
pub use table::{lookup, RateTable, LOOKBACK_DAYS};

use crate::config::RateSettings;

/// Pause between sequential bilateral chunk requests.
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 1000;

/// A currency hard-pegged to an anchor: one unit of `currency` is worth
/// `multiplier` units of `anchor`.
///
/// In config a peg gives either `multiplier` or `per_anchor`, the usual
/// quote of how many `currency` units buy one `anchor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PegEntry")]
pub struct Peg {
    pub currency: String,
    pub anchor: String,
    pub multiplier: Decimal,
}

impl Peg {
    /// Peg quoted as `units` of `currency` per one `anchor`.
    ///
    /// A zero quote yields a zero multiplier, which resolvers ignore.
    pub fn per_anchor(currency: &str, anchor: &str, units: Decimal) -> Self {
        Self {
            currency: currency.to_string(),
            anchor: anchor.to_string(),
            multiplier: Decimal::ONE.checked_div(units).unwrap_or(Decimal::ZERO),
        }
    }
}

#[derive(Deserialize)]
struct PegEntry {
    currency: String,
    anchor: String,
    #[serde(default)]
    multiplier: Option<Decimal>,
    #[serde(default)]
    per_anchor: Option<Decimal>,
}

impl TryFrom<PegEntry> for Peg {
    type Error = String;

    fn try_from(entry: PegEntry) -> std::result::Result<Self, Self::Error> {
        match (entry.multiplier, entry.per_anchor) {
            (Some(_), Some(_)) => Err(format!(
                "peg for {} sets both multiplier and per_anchor",
                entry.currency
            )),
            (Some(multiplier), None) => Ok(Peg {
                currency: entry.currency,
                anchor: entry.anchor,
                multiplier,
            }),
            (None, Some(units)) if units > Decimal::ZERO => {
                Ok(Peg::per_anchor(&entry.currency, &entry.anchor, units))
            }
            (None, Some(_)) => Err(format!("per_anchor for {} must be positive", entry.currency)),
            (None, None) => Err(format!(
                "peg for {} needs a multiplier or per_anchor",
                entry.currency
            )),
        }
    }
}

/// AED is pegged at 3.6725 per USD.
pub fn default_pegs() -> Vec<Peg> {
    vec![Peg::per_anchor("AED", "USD", Decimal::new(36725, 4))]
}

fn normalize(currency: &str) -> String {
    currency.trim().to_ascii_uppercase()
}

pub struct RateResolver {
    bilateral: Arc<dyn BilateralRateProvider>,
    cross: Arc<dyn CrossRateProvider>,
    cache: Arc<RateCache>,
    pegs: Vec<Peg>,
    chunk_delay: Duration,
}

impl RateResolver {
    pub fn new(
        bilateral: Arc<dyn BilateralRateProvider>,
        cross: Arc<dyn CrossRateProvider>,
        cache: Arc<RateCache>,
    ) -> Self {
        Self {
            bilateral,
            cross,
            cache,
            pegs: default_pegs(),
            chunk_delay: Duration::from_millis(DEFAULT_CHUNK_DELAY_MS),
        }
    }

    /// Replace the peg list. Pegs with a non-positive multiplier are ignored.
    pub fn with_pegs(mut self, pegs: Vec<Peg>) -> Self {
        self.pegs = pegs
            .into_iter()
            .filter(|p| p.multiplier > Decimal::ZERO)
            .map(|p| Peg {
                currency: normalize(&p.currency),
                anchor: normalize(&p.anchor),
                multiplier: p.multiplier,
            })
            .collect();
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Resolver backed by the live NBP and Frankfurter endpoints.
    pub fn from_settings(settings: &RateSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let bilateral = NbpProvider::new(&settings.bilateral_base_url, timeout)?;
        let cross = FrankfurterProvider::new(&settings.cross_base_url, timeout)?;

        Ok(Self::new(Arc::new(bilateral), Arc::new(cross), Arc::new(RateCache::new()))
            .with_pegs(settings.pegs.clone())
            .with_chunk_delay(Duration::from_millis(settings.chunk_delay_ms)))
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    fn peg(&self, currency: &str) -> Option<&Peg> {
        self.pegs.iter().find(|p| p.currency == currency)
    }

    /// The currency actually quoted upstream and how many of its units one
    /// unit of `currency` is worth. Chained pegs are followed to the end.
    fn unpeg(&self, currency: &str) -> (String, Decimal) {
        let mut current = currency.to_string();
        let mut factor = Decimal::ONE;
        // at most one hop per peg, so a cyclic list still terminates
        for _ in 0..self.pegs.len() {
            match self.peg(&current) {
                Some(peg) => {
                    factor *= peg.multiplier;
                    current = peg.anchor.clone();
                }
                None => break,
            }
        }
        (current, factor)
    }

    /// Rates of `from` in units of `to` for every available day in
    /// `start..=end`.
    ///
    /// Never fails: an upstream error is logged and yields an empty table,
    /// which is not cached.
    pub async fn resolve(&self, from: &str, to: &str, start: NaiveDate, end: NaiveDate) -> RateTable {
        let from = normalize(from);
        let to = normalize(to);
        if from == to {
            return RateTable::new();
        }

        let key = RateKey::new(&from, &to, start, end);
        if let Some(table) = self.cache.get(&key) {
            debug!("Rate cache hit for {}->{} ({} to {})", from, to, start, end);
            return table;
        }

        match self.compute(&from, &to, start, end).await {
            Ok(table) => {
                debug!("Resolved {}->{}: {} rates", from, to, table.len());
                self.cache.insert(key, table.clone());
                table
            }
            Err(e) => {
                warn!("Could not resolve {}->{} ({} to {}): {}", from, to, start, end, e);
                RateTable::new()
            }
        }
    }

    async fn compute(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateTable, RateError> {
        if start > end {
            return Ok(RateTable::new());
        }

        let (base, from_factor) = self.unpeg(from);
        let (quote, to_factor) = self.unpeg(to);
        let factor = from_factor / to_factor;

        if base == quote {
            debug!("Synthesizing constant {}->{} at {}", from, to, factor);
            return Ok(RateTable::constant(start, end, factor));
        }

        let table = self.fetch_direct(&base, &quote, start, end).await?;
        Ok(if factor == Decimal::ONE {
            table
        } else {
            table.scaled(factor)
        })
    }

    async fn fetch_direct(
        &self,
        base: &str,
        quote: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateTable, RateError> {
        let target = self.bilateral.target();
        if quote == target {
            self.fetch_bilateral(base, start, end).await
        } else if base == target {
            Ok(self.fetch_bilateral(quote, start, end).await?.inverted())
        } else {
            if let Some(unsupported) = [base, quote].into_iter().find(|c| !self.cross.supports(c)) {
                return Err(RateError::Unsupported {
                    provider: self.cross.id().to_string(),
                    currency: unsupported.to_string(),
                });
            }
            let symbols = [quote.to_string()];
            let payload = self.cross.fetch(base, &symbols, start, end).await?;
            Ok(payload.into_table(quote))
        }
    }

    /// Fetch `currency` against the bilateral target, chunk by chunk.
    async fn fetch_bilateral(
        &self,
        currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateTable, RateError> {
        let chunks = split_range(start, end, self.bilateral.max_span_days());
        if chunks.len() > 1 {
            info!(
                "Splitting {} {} request into {} chunks",
                self.bilateral.id(),
                currency,
                chunks.len()
            );
        }

        let mut merged = RateTable::new();
        for (i, (chunk_start, chunk_end)) in chunks.into_iter().enumerate() {
            if i > 0 && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
            let payload = self.bilateral.fetch(currency, chunk_start, chunk_end).await?;
            merged.merge(payload.into_table(currency));
        }
        Ok(merged)
    }

    fn bulk_eligible(&self, currency: &str, to: &str) -> bool {
        let target = self.bilateral.target();
        self.peg(currency).is_none()
            && self.peg(to).is_none()
            && currency != target
            && to != target
            && self.cross.supports(currency)
            && self.cross.supports(to)
    }

    /// Rates of each currency in units of `to`.
    ///
    /// Currencies the cross provider can serve together go out as one request;
    /// the rest (pegs, bilateral pairs, unsupported symbols) and any bulk
    /// failure fall back to concurrent [`resolve`](Self::resolve) calls.
    pub async fn resolve_bulk(
        &self,
        currencies: &[String],
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HashMap<String, RateTable> {
        let to = normalize(to);
        let mut resolved = HashMap::new();
        let mut bulk = Vec::new();
        let mut singles = Vec::new();

        for currency in currencies.iter().map(|c| normalize(c)).unique() {
            if currency == to {
                resolved.insert(currency, RateTable::new());
            } else if let Some(table) = self.cache.get(&RateKey::new(&currency, &to, start, end)) {
                resolved.insert(currency, table);
            } else if self.bulk_eligible(&currency, &to) {
                bulk.push(currency);
            } else {
                singles.push(currency);
            }
        }

        if !bulk.is_empty() {
            debug!("Bulk request for {} against {}", bulk.join(","), to);
            match self.cross.fetch(&to, &bulk, start, end).await {
                Ok(payload) => {
                    for (currency, table) in payload.into_tables(&bulk) {
                        let table = table.inverted();
                        self.cache
                            .insert(RateKey::new(&currency, &to, start, end), table.clone());
                        resolved.insert(currency, table);
                    }
                }
                Err(e) => {
                    warn!("Bulk rate request failed, resolving individually: {}", e);
                    singles.extend(bulk);
                }
            }
        }

        let to = to.as_str();
        let individual = join_all(singles.into_iter().map(|currency| async move {
            let table = self.resolve(&currency, to, start, end).await;
            (currency, table)
        }))
        .await;
        resolved.extend(individual);
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Quotes everything in PLN at a fixed rate, one observation per chunk start.
    struct MockBilateral {
        rate: Option<f64>,
        calls: AtomicUsize,
        ranges: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
        stamps: Mutex<Vec<tokio::time::Instant>>,
    }

    impl MockBilateral {
        fn new(rate: Option<f64>) -> Arc<Self> {
            Arc::new(Self {
                rate,
                calls: AtomicUsize::new(0),
                ranges: Mutex::new(Vec::new()),
                stamps: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BilateralRateProvider for MockBilateral {
        fn id(&self) -> &'static str {
            "MOCK-BILATERAL"
        }

        fn target(&self) -> &str {
            "PLN"
        }

        async fn fetch(
            &self,
            currency: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<RatePayload, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ranges
                .lock()
                .unwrap()
                .push((currency.to_string(), start, end));
            self.stamps.lock().unwrap().push(tokio::time::Instant::now());
            match self.rate {
                Some(value) => Ok(RatePayload::Series(vec![Observation {
                    date: start.to_string(),
                    value,
                }])),
                None => Err(RateError::Network {
                    provider: "MOCK-BILATERAL".into(),
                    message: "connection refused".into(),
                }),
            }
        }
    }

    /// Grid provider with a fixed per-symbol rate on the start date.
    struct MockCross {
        rates: HashMap<String, f64>,
        fail: bool,
        calls: AtomicUsize,
        requests: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl MockCross {
        fn new(rates: &[(&str, f64)]) -> Arc<Self> {
            Arc::new(Self {
                rates: rates.iter().map(|(c, v)| (c.to_string(), *v)).collect(),
                fail: false,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                rates: HashMap::new(),
                fail: true,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CrossRateProvider for MockCross {
        fn id(&self) -> &'static str {
            "MOCK-CROSS"
        }

        fn supports(&self, currency: &str) -> bool {
            ["USD", "EUR", "CNY", "PLN", "GBP"].contains(&currency)
        }

        async fn fetch(
            &self,
            base: &str,
            symbols: &[String],
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<RatePayload, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((base.to_string(), symbols.to_vec()));
            if self.fail {
                return Err(RateError::Status {
                    provider: "MOCK-CROSS".into(),
                    status: 503,
                });
            }
            let day: HashMap<String, f64> = symbols
                .iter()
                .filter_map(|s| self.rates.get(s).map(|v| (s.clone(), *v)))
                .collect();
            Ok(RatePayload::Grid(BTreeMap::from([(start.to_string(), day)])))
        }
    }

    fn aed_in_usd() -> Decimal {
        Decimal::ONE / dec!(3.6725)
    }

    fn resolver(bilateral: Arc<MockBilateral>, cross: Arc<MockCross>) -> RateResolver {
        RateResolver::new(bilateral, cross, Arc::new(RateCache::new()))
            .with_chunk_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_identity_pair_is_empty_without_requests() {
        let bilateral = MockBilateral::new(Some(4.0));
        let cross = MockCross::new(&[]);
        let r = resolver(bilateral.clone(), cross.clone());

        let table = r.resolve("usd", "USD", d(2024, 1, 1), d(2024, 1, 31)).await;
        assert!(table.is_empty());
        assert_eq!(bilateral.calls() + cross.calls(), 0);
    }

    #[tokio::test]
    async fn test_bilateral_range_is_split_into_two_chunks() {
        let bilateral = MockBilateral::new(Some(4.3));
        let r = resolver(bilateral.clone(), MockCross::new(&[]));
        let start = d(2023, 1, 1);
        let end = start + chrono::Duration::days(399);

        let table = r.resolve("EUR", "PLN", start, end).await;

        assert_eq!(bilateral.calls(), 2);
        let ranges = bilateral.ranges.lock().unwrap().clone();
        assert_eq!(ranges[0].1, start);
        assert_eq!(ranges[1].1, ranges[0].2 + chrono::Duration::days(1));
        assert_eq!(ranges[1].2, end);
        assert!(ranges.iter().all(|(_, s, e)| (*e - *s).num_days() < 365));
        assert_eq!(table.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_are_spaced_by_the_configured_delay() {
        let bilateral = MockBilateral::new(Some(4.3));
        let r = RateResolver::new(
            bilateral.clone(),
            MockCross::new(&[]),
            Arc::new(RateCache::new()),
        )
        .with_chunk_delay(Duration::from_secs(1));
        let start = d(2023, 1, 1);
        let began = tokio::time::Instant::now();

        r.resolve("EUR", "PLN", start, start + chrono::Duration::days(399)).await;

        assert_eq!(bilateral.calls(), 2);
        let stamps = bilateral.stamps.lock().unwrap().clone();
        assert_eq!(stamps[0], began);
        assert!(stamps[1] - stamps[0] >= Duration::from_secs(1));
        assert!(began.elapsed() >= Duration::from_secs(1));

        // a single chunk never waits
        let single = tokio::time::Instant::now();
        r.resolve("GBP", "PLN", start, start + chrono::Duration::days(10)).await;
        assert_eq!(bilateral.calls(), 3);
        assert_eq!(single.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_cache_hit_issues_no_second_request() {
        let bilateral = MockBilateral::new(Some(4.0));
        let r = resolver(bilateral.clone(), MockCross::new(&[]));

        let first = r.resolve("USD", "PLN", d(2024, 1, 1), d(2024, 1, 31)).await;
        let second = r.resolve("usd", "pln", d(2024, 1, 1), d(2024, 1, 31)).await;

        assert_eq!(first, second);
        assert_eq!(bilateral.calls(), 1);
        assert_eq!(r.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_and_is_not_cached() {
        let bilateral = MockBilateral::new(None);
        let r = resolver(bilateral.clone(), MockCross::new(&[]));

        let table = r.resolve("USD", "PLN", d(2024, 1, 1), d(2024, 1, 31)).await;
        assert!(table.is_empty());
        assert!(r.cache().is_empty());

        r.resolve("USD", "PLN", d(2024, 1, 1), d(2024, 1, 31)).await;
        assert_eq!(bilateral.calls(), 2);
    }

    #[tokio::test]
    async fn test_bilateral_target_on_from_side_is_inverted() {
        let bilateral = MockBilateral::new(Some(4.0));
        let r = resolver(bilateral.clone(), MockCross::new(&[]));

        let table = r.resolve("PLN", "USD", d(2024, 1, 2), d(2024, 1, 5)).await;

        assert_eq!(table.get(d(2024, 1, 2)), Some(dec!(0.25)));
        let ranges = bilateral.ranges.lock().unwrap().clone();
        assert_eq!(ranges[0].0, "USD");
    }

    #[tokio::test]
    async fn test_peg_against_anchor_is_constant_without_requests() {
        let bilateral = MockBilateral::new(Some(4.0));
        let cross = MockCross::new(&[]);
        let r = resolver(bilateral.clone(), cross.clone());

        let table = r.resolve("AED", "USD", d(2024, 1, 1), d(2024, 1, 5)).await;

        assert_eq!(table.len(), 5);
        assert!(table.iter().all(|(_, rate)| rate == aed_in_usd()));
        assert_eq!(bilateral.calls() + cross.calls(), 0);

        let reverse = r.resolve("USD", "AED", d(2024, 1, 1), d(2024, 1, 1)).await;
        let usd_in_aed = reverse.get(d(2024, 1, 1)).unwrap();
        assert!((usd_in_aed - dec!(3.6725)).abs() < dec!(0.000000000000000000001));
        assert_eq!(usd_in_aed.round_dp(8), dec!(3.6725));
    }

    #[tokio::test]
    async fn test_peg_resolves_through_anchor() {
        let cross = MockCross::new(&[("EUR", 0.9), ("USD", 1.1)]);
        let r = resolver(MockBilateral::new(Some(4.0)), cross.clone());

        let aed_eur = r.resolve("AED", "EUR", d(2024, 1, 2), d(2024, 1, 2)).await;
        assert_eq!(aed_eur.get(d(2024, 1, 2)), Some(dec!(0.9) * aed_in_usd()));

        let eur_aed = r.resolve("EUR", "AED", d(2024, 1, 2), d(2024, 1, 2)).await;
        assert_eq!(
            eur_aed.get(d(2024, 1, 2)),
            Some(dec!(1.1) * (Decimal::ONE / aed_in_usd()))
        );

        let requests = cross.requests.lock().unwrap().clone();
        assert_eq!(requests[0], ("USD".to_string(), vec!["EUR".to_string()]));
        assert_eq!(requests[1], ("EUR".to_string(), vec!["USD".to_string()]));
    }

    #[tokio::test]
    async fn test_bulk_uses_one_cross_request() {
        let cross = MockCross::new(&[("EUR", 0.8), ("CNY", 8.0)]);
        let r = resolver(MockBilateral::new(Some(4.0)), cross.clone());
        let currencies = vec![
            "eur".to_string(),
            "CNY".to_string(),
            "EUR".to_string(),
            "USD".to_string(),
        ];

        let tables = r
            .resolve_bulk(&currencies, "USD", d(2024, 1, 2), d(2024, 1, 9))
            .await;

        assert_eq!(cross.calls(), 1);
        assert_eq!(tables.len(), 3);
        assert!(tables["USD"].is_empty());
        assert_eq!(tables["EUR"].get(d(2024, 1, 2)), Some(dec!(1.25)));
        assert_eq!(tables["CNY"].get(d(2024, 1, 2)), Some(dec!(0.125)));

        let requests = cross.requests.lock().unwrap().clone();
        assert_eq!(requests[0].0, "USD");
        assert_eq!(requests[0].1, vec!["EUR".to_string(), "CNY".to_string()]);

        // Bulk results land in the cache like single resolutions.
        r.resolve("EUR", "USD", d(2024, 1, 2), d(2024, 1, 9)).await;
        assert_eq!(cross.calls(), 1);
    }

    #[tokio::test]
    async fn test_bulk_routes_pegs_and_bilateral_pairs_individually() {
        let bilateral = MockBilateral::new(Some(4.0));
        let cross = MockCross::new(&[("EUR", 0.8)]);
        let r = resolver(bilateral.clone(), cross.clone());
        let currencies = vec!["AED".to_string(), "PLN".to_string(), "EUR".to_string()];

        let tables = r
            .resolve_bulk(&currencies, "USD", d(2024, 1, 2), d(2024, 1, 3))
            .await;

        assert_eq!(tables["AED"].get(d(2024, 1, 3)), Some(aed_in_usd()));
        assert_eq!(tables["PLN"].get(d(2024, 1, 2)), Some(dec!(0.25)));
        assert_eq!(tables["EUR"].get(d(2024, 1, 2)), Some(dec!(1.25)));
        assert_eq!(bilateral.calls(), 1);
        assert_eq!(cross.calls(), 1);
    }

    #[tokio::test]
    async fn test_bulk_failure_falls_back_to_single_requests() {
        let cross = MockCross::failing();
        let r = resolver(MockBilateral::new(Some(4.0)), cross.clone());

        let tables = r
            .resolve_bulk(&["EUR".to_string()], "USD", d(2024, 1, 2), d(2024, 1, 3))
            .await;

        assert!(tables["EUR"].is_empty());
        assert_eq!(cross.calls(), 2);
        assert!(r.cache().is_empty());
    }

    #[test]
    fn test_with_pegs_normalizes_and_drops_invalid() {
        let r = resolver(MockBilateral::new(None), MockCross::new(&[])).with_pegs(vec![
            Peg {
                currency: "sar".into(),
                anchor: "usd".into(),
                multiplier: dec!(0.2666),
            },
            Peg {
                currency: "XXX".into(),
                anchor: "USD".into(),
                multiplier: Decimal::ZERO,
            },
        ]);
        assert_eq!(r.unpeg("SAR"), ("USD".to_string(), dec!(0.2666)));
        assert_eq!(r.unpeg("XXX"), ("XXX".to_string(), Decimal::ONE));
        assert_eq!(r.unpeg("AED"), ("AED".to_string(), Decimal::ONE));
    }

    #[tokio::test]
    async fn test_chained_pegs_resolve_to_the_last_anchor() {
        let cross = MockCross::new(&[("EUR", 0.9)]);
        let r = resolver(MockBilateral::new(Some(4.0)), cross.clone()).with_pegs(vec![
            Peg::per_anchor("XAA", "SAR", dec!(2)),
            Peg::per_anchor("SAR", "USD", dec!(4)),
        ]);

        assert_eq!(r.unpeg("XAA"), ("USD".to_string(), dec!(0.125)));

        let constant = r.resolve("XAA", "USD", d(2024, 1, 2), d(2024, 1, 3)).await;
        assert_eq!(constant.get(d(2024, 1, 3)), Some(dec!(0.125)));
        let to_sar = r.resolve("XAA", "SAR", d(2024, 1, 2), d(2024, 1, 2)).await;
        assert_eq!(to_sar.get(d(2024, 1, 2)), Some(dec!(0.5)));
        assert_eq!(cross.calls(), 0);

        let xaa_eur = r.resolve("XAA", "EUR", d(2024, 1, 2), d(2024, 1, 2)).await;
        assert_eq!(xaa_eur.get(d(2024, 1, 2)), Some(dec!(0.9) * dec!(0.125)));
        assert_eq!(cross.calls(), 1);
    }

    #[test]
    fn test_cyclic_pegs_terminate() {
        let r = resolver(MockBilateral::new(None), MockCross::new(&[])).with_pegs(vec![
            Peg::per_anchor("AAA", "BBB", dec!(2)),
            Peg::per_anchor("BBB", "AAA", dec!(2)),
        ]);
        assert_eq!(r.unpeg("AAA").1, dec!(0.25));
    }

    #[test]
    fn test_default_peg_is_exact_reciprocal() {
        let peg = &default_pegs()[0];
        assert_eq!(peg.multiplier, Decimal::ONE / dec!(3.6725));
        assert_eq!(Peg::per_anchor("AED", "USD", Decimal::ZERO).multiplier, Decimal::ZERO);
    }
}
