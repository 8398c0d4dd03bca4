use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// How many days before the requested date a lookup may fall back to.
pub const LOOKBACK_DAYS: i64 = 6;

/// Decimal places kept when a rate is inverted.
const INVERSE_SCALE: u32 = 10;

/// Historical rates for one currency pair, keyed by calendar date.
///
/// Only positive rates are ever stored; gaps (weekends, holidays) are normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateTable {
    rates: BTreeMap<NaiveDate, Decimal>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every date in `start..=end` mapped to the same rate.
    pub fn constant(start: NaiveDate, end: NaiveDate, rate: Decimal) -> Self {
        let mut table = Self::new();
        let mut day = start;
        while day <= end {
            table.insert(day, rate);
            day += Duration::days(1);
        }
        table
    }

    /// Store a rate; zero or negative values are dropped.
    pub fn insert(&mut self, date: NaiveDate, rate: Decimal) {
        if rate > Decimal::ZERO {
            self.rates.insert(date, rate);
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<Decimal> {
        self.rates.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Decimal)> + '_ {
        self.rates.iter().map(|(d, r)| (*d, *r))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rates.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rates.keys().next_back().copied()
    }

    /// Merge another table in; later values win on the same date.
    pub fn merge(&mut self, other: RateTable) {
        self.rates.extend(other.rates);
    }

    /// Multiply every rate by `factor`.
    pub fn scaled(self, factor: Decimal) -> Self {
        self.rates
            .into_iter()
            .map(|(date, rate)| (date, rate * factor))
            .collect()
    }

    /// Flip the quote direction (A→B becomes B→A).
    pub fn inverted(self) -> Self {
        self.rates
            .into_iter()
            .map(|(date, rate)| (date, (Decimal::ONE / rate).round_dp(INVERSE_SCALE)))
            .collect()
    }
}

impl FromIterator<(NaiveDate, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Decimal)>>(iter: I) -> Self {
        let mut table = RateTable::new();
        for (date, rate) in iter {
            table.insert(date, rate);
        }
        table
    }
}

/// Rate published on `date`, or the closest earlier one within
/// [`LOOKBACK_DAYS`]. Returns zero when nothing usable is found; callers must
/// treat zero as "cannot convert".
pub fn lookup(date: NaiveDate, table: &RateTable) -> Decimal {
    (0..=LOOKBACK_DAYS)
        .filter_map(|back| date.checked_sub_signed(Duration::days(back)))
        .find_map(|day| table.get(day))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_lookup_walks_back_within_window() {
        let table: RateTable = [(d(2024, 1, 10), dec!(4.0))].into_iter().collect();
        assert_eq!(lookup(d(2024, 1, 10), &table), dec!(4.0));
        assert_eq!(lookup(d(2024, 1, 15), &table), dec!(4.0));
        assert_eq!(lookup(d(2024, 1, 16), &table), dec!(4.0));
        assert_eq!(lookup(d(2024, 1, 17), &table), Decimal::ZERO);
        assert_eq!(lookup(d(2024, 1, 20), &table), Decimal::ZERO);
    }

    #[test]
    fn test_lookup_never_looks_forward() {
        let table: RateTable = [(d(2024, 1, 10), dec!(4.0))].into_iter().collect();
        assert_eq!(lookup(d(2024, 1, 9), &table), Decimal::ZERO);
    }

    #[test]
    fn test_lookup_prefers_most_recent() {
        let table: RateTable = [(d(2024, 1, 8), dec!(1.0)), (d(2024, 1, 10), dec!(2.0))]
            .into_iter()
            .collect();
        assert_eq!(lookup(d(2024, 1, 12), &table), dec!(2.0));
        assert_eq!(lookup(d(2024, 1, 9), &table), dec!(1.0));
    }

    #[test]
    fn test_non_positive_rates_are_dropped() {
        let table: RateTable = [(d(2024, 1, 1), dec!(0)), (d(2024, 1, 2), dec!(-1))]
            .into_iter()
            .collect();
        assert!(table.is_empty());
        assert_eq!(lookup(d(2024, 1, 2), &table), Decimal::ZERO);
    }

    #[test]
    fn test_constant_fills_inclusive_range() {
        let table = RateTable::constant(d(2024, 2, 27), d(2024, 3, 2), dec!(0.5));
        assert_eq!(table.len(), 5);
        assert_eq!(table.first_date(), Some(d(2024, 2, 27)));
        assert_eq!(table.last_date(), Some(d(2024, 3, 2)));
        assert!(table.iter().all(|(_, r)| r == dec!(0.5)));
        assert!(RateTable::constant(d(2024, 3, 2), d(2024, 3, 1), dec!(1)).is_empty());
    }

    #[test]
    fn test_inverted_and_scaled() {
        let table: RateTable = [(d(2024, 1, 1), dec!(4))].into_iter().collect();
        assert_eq!(table.clone().inverted().get(d(2024, 1, 1)), Some(dec!(0.25)));
        assert_eq!(table.scaled(dec!(1.5)).get(d(2024, 1, 1)), Some(dec!(6.0)));
    }
}
