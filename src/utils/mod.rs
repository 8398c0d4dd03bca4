//! Utility functions for formatting and common operations
//!
//! Centralized formatting of money, percentages and item metadata so every
//! table and summary line renders values the same way.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Core formatting function with full control over output.
///
/// Formats a Decimal with `,` thousands separators and two decimals, followed
/// by the currency code when one is given.
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
/// * `currency` - ISO code appended after the number, if any
///
/// # Examples
/// ```
/// use skinledger::utils::format_amount_with_width;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount_with_width(dec!(1234.56), 0, Some("USD")), "1,234.56 USD");
/// assert_eq!(format_amount_with_width(dec!(1234), 12, None), "    1,234.00");
/// ```
pub fn format_amount_with_width(value: Decimal, width: usize, currency: Option<&str>) -> String {
    let is_negative = value < Decimal::ZERO;
    let formatted = format!("{:.2}", value.abs().round_dp(2));
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let with_separators: String = digits
        .iter()
        .enumerate()
        .flat_map(|(i, c)| {
            let remaining = digits.len() - i;
            if i > 0 && remaining % 3 == 0 {
                vec![',', *c]
            } else {
                vec![*c]
            }
        })
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let result = match currency {
        Some(code) => format!("{}{}.{} {}", sign, with_separators, decimal_part, code),
        None => format!("{}{}.{}", sign, with_separators, decimal_part),
    };

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

// ============ Convenience functions ============

/// Format with currency code: "1,234.56 PLN"
///
/// # Examples
/// ```
/// use skinledger::utils::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(1234.56), "PLN"), "1,234.56 PLN");
/// assert_eq!(format_amount(dec!(-500), "USD"), "-500.00 USD");
/// ```
pub fn format_amount(value: Decimal, currency: &str) -> String {
    format_amount_with_width(value, 0, Some(currency))
}

/// Number only: "1,234.56"
pub fn format_decimal(value: Decimal) -> String {
    format_amount_with_width(value, 0, None)
}

/// Number or "N/A" for values that could not be converted.
pub fn format_optional(value: Option<Decimal>) -> String {
    value
        .map(format_decimal)
        .unwrap_or_else(|| "N/A".to_string())
}

/// "12.50%"
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}

/// Wear value with 8 decimals, or "-" when the item has none.
pub fn format_float(value: f64) -> String {
    if value > 0.0 {
        format!("{:.8}", value)
    } else {
        "-".to_string()
    }
}

/// Pattern index, or "-" for the no-pattern sentinel.
pub fn format_pattern(value: i32) -> String {
    if value < 0 {
        "-".to_string()
    } else {
        value.to_string()
    }
}

pub fn format_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}
