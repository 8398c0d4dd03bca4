//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of reconciliation and valuation from presentation.

use colored::Colorize;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use skinledger::matching::{Match, MatchType, ValuedInventoryItem};
use skinledger::rates::RateTable;
use skinledger::reports::{LedgerRow, ProfitReport, TradeLedger};
use skinledger::utils::{
    format_amount, format_date, format_decimal, format_float, format_optional, format_pattern,
    format_percent,
};

/// Pretty JSON for any report
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

fn signed(value: Decimal, text: String) -> String {
    if value >= Decimal::ZERO {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

fn match_type_label(match_type: MatchType) -> String {
    match match_type {
        MatchType::Meta => "meta".green().to_string(),
        MatchType::AssetId => "asset_id".cyan().to_string(),
        MatchType::None => "none".yellow().to_string(),
    }
}

/// Reconciled sales in native prices
pub fn format_matches_table(matches: &[Match]) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{} Reconciled sales\n\n", "🔗".cyan().bold()));

    #[derive(Tabled)]
    struct MatchRow {
        #[tabled(rename = "Item")]
        item: String,
        #[tabled(rename = "Float")]
        float: String,
        #[tabled(rename = "Pattern")]
        pattern: String,
        #[tabled(rename = "Match")]
        match_type: String,
        #[tabled(rename = "Buy Source")]
        buy_source: String,
        #[tabled(rename = "Buy Date")]
        buy_date: String,
        #[tabled(rename = "Buy Price")]
        buy_price: String,
        #[tabled(rename = "Sell Source")]
        sell_source: String,
        #[tabled(rename = "Sell Date")]
        sell_date: String,
        #[tabled(rename = "Sell Price")]
        sell_price: String,
        #[tabled(rename = "Profit")]
        profit: String,
        #[tabled(rename = "Profit %")]
        profit_pct: String,
    }

    let rows: Vec<MatchRow> = matches
        .iter()
        .map(|m| MatchRow {
            item: m.item_name().to_string(),
            float: format_float(m.float_val()),
            pattern: format_pattern(m.pattern()),
            match_type: match_type_label(m.match_type),
            buy_source: m.buy_source().to_string(),
            buy_date: format_date(m.buy_date()),
            buy_price: format_amount(m.buy_price(), m.buy_currency()),
            sell_source: m.sell.source.clone(),
            sell_date: format_date(Some(m.sell_date())),
            sell_price: format_amount(m.sell.price, &m.sell.currency),
            profit: signed(m.profit, format_decimal(m.profit)),
            profit_pct: signed(m.profit_percent, format_percent(m.profit_percent)),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(6..7), Alignment::right());
    table.modify(Columns::new(9..), Alignment::right());
    output.push_str(&table.to_string());

    let counts = matches.iter().counts_by(|m| m.match_type);
    let count = |t: MatchType| counts.get(&t).copied().unwrap_or(0);
    output.push_str(&format!("\n\n{} Summary", "━".repeat(80).bright_black()));
    output.push_str(&format!("\n{:<20} {}", "Sales:".bold(), matches.len()));
    output.push_str(&format!(
        "\n{:<20} {} meta, {} asset_id",
        "Matched:".bold(),
        count(MatchType::Meta),
        count(MatchType::AssetId)
    ));
    output.push_str(&format!(
        "\n{:<20} {}\n",
        "Unmatched:".bold(),
        count(MatchType::None).to_string().yellow()
    ));
    output
}

/// Held items with their cost basis
pub fn format_inventory_table(items: &[ValuedInventoryItem]) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{} Inventory cost basis\n\n", "📦".cyan().bold()));

    #[derive(Tabled)]
    struct InventoryRow {
        #[tabled(rename = "Item")]
        item: String,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Float")]
        float: String,
        #[tabled(rename = "Pattern")]
        pattern: String,
        #[tabled(rename = "Tradable")]
        tradable: String,
        #[tabled(rename = "Buy Source")]
        buy_source: String,
        #[tabled(rename = "Buy Date")]
        buy_date: String,
        #[tabled(rename = "Buy Price")]
        buy_price: String,
    }

    let rows: Vec<InventoryRow> = items
        .iter()
        .map(|v| InventoryRow {
            item: v.item.item_name.clone(),
            source: v.item.source.clone(),
            float: format_float(v.item.float_val),
            pattern: format_pattern(v.item.pattern),
            tradable: if v.item.is_tradable { "yes" } else { "no" }.to_string(),
            buy_source: if v.is_matched {
                v.buy_source.clone()
            } else {
                v.buy_source.yellow().to_string()
            },
            buy_date: format_date(v.buy_date),
            buy_price: format_amount(v.buy_price, &v.buy_currency),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(7..), Alignment::right());
    output.push_str(&table.to_string());

    let matched = items.iter().filter(|v| v.is_matched).count();
    output.push_str(&format!(
        "\n\n{:<20} {} of {} items\n",
        "With cost basis:".bold(),
        matched,
        items.len()
    ));
    output
}

/// Valued profit report in its reporting currency
pub fn format_profit_report(report: &ProfitReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} Profit report {} ({})\n\n",
        "💰".cyan().bold(),
        report.period,
        report.currency
    ));

    #[derive(Tabled)]
    struct ProfitRow {
        #[tabled(rename = "Item")]
        item: String,
        #[tabled(rename = "Float")]
        float: String,
        #[tabled(rename = "Match")]
        match_type: String,
        #[tabled(rename = "Buy Source")]
        buy_source: String,
        #[tabled(rename = "Buy Date")]
        buy_date: String,
        #[tabled(rename = "Cost")]
        cost: String,
        #[tabled(rename = "Sell Source")]
        sell_source: String,
        #[tabled(rename = "Sell Date")]
        sell_date: String,
        #[tabled(rename = "Income")]
        income: String,
        #[tabled(rename = "Profit")]
        profit: String,
        #[tabled(rename = "Profit %")]
        profit_pct: String,
    }

    let rows: Vec<ProfitRow> = report
        .rows
        .iter()
        .map(|row| {
            let m = &row.matched;
            ProfitRow {
                item: m.item_name().to_string(),
                float: format_float(m.float_val()),
                match_type: match_type_label(m.match_type),
                buy_source: m.buy_source().to_string(),
                buy_date: format_date(m.buy_date()),
                cost: format_optional(row.buy_value),
                sell_source: m.sell.source.clone(),
                sell_date: format_date(Some(m.sell_date())),
                income: format_optional(row.sell_value),
                profit: row
                    .value_profit
                    .map(|p| signed(p, format_decimal(p)))
                    .unwrap_or_else(|| "N/A".red().to_string()),
                profit_pct: row
                    .value_profit_percent
                    .map(|p| signed(p, format_percent(p)))
                    .unwrap_or_else(|| "N/A".to_string()),
            }
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(5..6), Alignment::right());
    table.modify(Columns::new(8..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!("\n\n{} Summary", "━".repeat(80).bright_black()));
    output.push_str(&format!(
        "\n{:<20} {} matched, {} unmatched",
        "Sales:".bold(),
        report.matched_count,
        report.unmatched_count
    ));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Cost:".bold(),
        format_amount(report.total_bought, &report.currency)
    ));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Income:".bold(),
        format_amount(report.total_sold, &report.currency)
    ));
    output.push_str(&format!(
        "\n{:<20} {}\n",
        "Total Profit:".bold(),
        signed(
            report.total_profit,
            format_amount(report.total_profit, &report.currency)
        )
    ));
    if report.unconvertible_count > 0 {
        output.push_str(&format!(
            "{} {} sales had no exchange rate and are excluded from totals\n",
            "⚠".yellow().bold(),
            report.unconvertible_count
        ));
    }
    output
}

fn ledger_section(title: &str, rows: &[LedgerRow], ledger: &TradeLedger) -> String {
    #[derive(Tabled)]
    struct LedgerLine {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Item")]
        item: String,
        #[tabled(rename = "Float")]
        float: String,
        #[tabled(rename = "Pattern")]
        pattern: String,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Tx ID")]
        tx_id: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Pivot")]
        pivot: String,
        #[tabled(rename = "Target")]
        target: String,
    }

    let lines: Vec<LedgerLine> = rows
        .iter()
        .map(|r| LedgerLine {
            date: r.date.to_string(),
            item: r.transaction.item_name.clone(),
            float: format_float(r.transaction.float_val),
            pattern: format_pattern(r.transaction.pattern),
            source: r.transaction.source.clone(),
            tx_id: r.transaction.tx_id.clone(),
            price: format_amount(r.transaction.price, &r.transaction.currency),
            pivot: r
                .pivot_amount
                .map(|a| format_amount(a, &ledger.pivot_currency))
                .unwrap_or_else(|| "N/A".to_string()),
            target: r
                .target_amount
                .map(|a| format_amount(a, &ledger.target_currency))
                .unwrap_or_else(|| "N/A".to_string()),
        })
        .collect();

    let mut table = Table::new(&lines);
    table.with(Style::modern());
    table.modify(Columns::new(6..), Alignment::right());
    format!("\n{}\n{}\n", title.bold(), table)
}

/// Monthly trade ledger with buys and sales sections
pub fn format_ledger(ledger: &TradeLedger) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} Trade ledger {} ({} → {})\n",
        "📒".cyan().bold(),
        ledger.period,
        ledger.pivot_currency,
        ledger.target_currency
    ));
    output.push_str(&ledger_section("Buys", &ledger.buys, ledger));
    output.push_str(&ledger_section("Sales", &ledger.sales, ledger));

    output.push_str(&format!("\n{} Summary", "━".repeat(80).bright_black()));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Spent:".bold(),
        format_amount(ledger.total_spent, &ledger.target_currency)
    ));
    output.push_str(&format!(
        "\n{:<20} {}\n",
        "Total Income:".bold(),
        format_amount(ledger.total_income, &ledger.target_currency)
    ));
    if ledger.unconvertible_count > 0 {
        output.push_str(&format!(
            "{} {} transactions had no exchange rate and are excluded from totals\n",
            "⚠".yellow().bold(),
            ledger.unconvertible_count
        ));
    }
    output
}

/// Resolved rate table for one pair
pub fn format_rates_table(table: &RateTable, from: &str, to: &str) -> String {
    if table.is_empty() {
        return format!(
            "{} No {}/{} rates available for this range\n",
            "ℹ".blue().bold(),
            from,
            to
        );
    }

    #[derive(Tabled)]
    struct RateRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Rate")]
        rate: String,
    }

    let rows: Vec<RateRow> = table
        .iter()
        .map(|(date, rate)| RateRow {
            date: date.to_string(),
            rate: rate.normalize().to_string(),
        })
        .collect();

    let mut t = Table::new(&rows);
    t.with(Style::modern());
    t.modify(Columns::new(1..), Alignment::right());
    format!(
        "\n{} 1 {} in {}\n\n{}\n",
        "💱".cyan().bold(),
        from,
        to,
        t
    )
}

/// Message for commands that found nothing to show
pub fn format_empty(what: &str) -> String {
    format!("{} No {} found\n", "ℹ".blue().bold(), what)
}
