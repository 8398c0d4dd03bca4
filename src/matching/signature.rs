use serde::{Serialize, Serializer};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use crate::models::{InventoryItem, Transaction, NO_PATTERN};

/// Wear values are grouped at 8 decimal places.
const WEAR_SCALE: f64 = 100_000_000.0;

/// Identity fingerprint grouping potentially identical items.
///
/// Items without wear metadata group by name alone (the pattern is ignored
/// for them too); everything else groups by name, wear bucket and pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signature {
    Name(String),
    Graded {
        name: String,
        wear_bucket: i64,
        pattern: i32,
    },
}

impl Signature {
    pub fn name(&self) -> &str {
        match self {
            Signature::Name(name) | Signature::Graded { name, .. } => name,
        }
    }
}

/// Build the signature for an item.
///
/// `wear` of `None`, `0` or anything non-finite collapses to a name-only key.
/// A missing pattern is treated as the `-1` sentinel.
pub fn signature(name: &str, wear: Option<f64>, pattern: Option<i32>) -> Signature {
    let name: String = name.nfc().collect();
    match wear.filter(|w| w.is_finite() && *w != 0.0) {
        None => Signature::Name(name),
        Some(wear) => Signature::Graded {
            name,
            wear_bucket: (wear * WEAR_SCALE).round() as i64,
            pattern: pattern.unwrap_or(NO_PATTERN),
        },
    }
}

impl From<&Transaction> for Signature {
    fn from(tx: &Transaction) -> Self {
        signature(&tx.item_name, Some(tx.float_val), Some(tx.pattern))
    }
}

impl From<&InventoryItem> for Signature {
    fn from(item: &InventoryItem) -> Self {
        signature(&item.item_name, Some(item.float_val), Some(item.pattern))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Name(name) => f.write_str(name),
            Signature::Graded {
                name,
                wear_bucket,
                pattern,
            } => {
                let sign = if *wear_bucket < 0 { "-" } else { "" };
                let abs = wear_bucket.unsigned_abs();
                write!(
                    f,
                    "{}|{}{}.{:08}|{}",
                    name,
                    sign,
                    abs / 100_000_000,
                    abs % 100_000_000,
                    pattern
                )
            }
        }
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_insensitive() {
        let a = signature("Item", Some(0.25), Some(5));
        let b = signature("Item", Some("0.25000000".parse().unwrap()), Some(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_wear_is_name_only() {
        assert_eq!(
            signature("Case", Some(0.0), Some(-1)),
            Signature::Name("Case".to_string())
        );
        assert_eq!(signature("Case", Some(0.0), Some(-1)).to_string(), "Case");
        // pattern is ignored without wear
        assert_eq!(
            signature("Case", None, Some(7)),
            signature("Case", Some(0.0), None)
        );
    }

    #[test]
    fn test_wear_rounds_to_eight_decimals() {
        let a = signature("Knife", Some(0.123456781), Some(3));
        let b = signature("Knife", Some(0.123456784), Some(3));
        let c = signature("Knife", Some(0.12345679), Some(3));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_pattern_distinguishes_graded_items() {
        assert_ne!(
            signature("Knife", Some(0.01), Some(1)),
            signature("Knife", Some(0.01), Some(2))
        );
        assert_eq!(
            signature("Knife", Some(0.01), None),
            signature("Knife", Some(0.01), Some(-1))
        );
    }

    #[test]
    fn test_display_matches_legacy_key() {
        assert_eq!(
            signature("AWP | Asiimov", Some(0.25), Some(5)).to_string(),
            "AWP | Asiimov|0.25000000|5"
        );
        assert_eq!(
            signature("Gloves", Some(1.5), None).to_string(),
            "Gloves|1.50000000|-1"
        );
    }

    #[test]
    fn test_unicode_forms_group_together() {
        let composed = signature("Caf\u{e9}", None, None);
        let decomposed = signature("Cafe\u{301}", None, None);
        assert_eq!(composed, decomposed);
        assert_eq!(composed.name(), "Caf\u{e9}");
    }
}
