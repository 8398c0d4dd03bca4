use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::table::RateTable;

/// Identity of one resolved request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub from: String,
    pub to: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RateKey {
    pub fn new(from: &str, to: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            start,
            end,
        }
    }
}

/// Process-wide store of resolved rate tables.
///
/// Only successful resolutions are stored. The lock is held for the map
/// operation alone, never across a request.
#[derive(Debug, Default)]
pub struct RateCache {
    tables: Mutex<HashMap<RateKey, RateTable>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<RateKey, RateTable>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &RateKey) -> Option<RateTable> {
        self.guard().get(key).cloned()
    }

    pub fn insert(&self, key: RateKey, table: RateTable) {
        self.guard().insert(key, table);
    }

    pub fn contains(&self, key: &RateKey) -> bool {
        self.guard().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }
}
