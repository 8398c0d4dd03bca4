//! Command dispatcher that routes parsed clap commands to their handlers.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::cli::formatters;
use crate::cli::{Cli, Commands};
use skinledger::config::Settings;
use skinledger::input::{load_inventory, load_transactions};
use skinledger::matching::{match_inventory, Reconciler};
use skinledger::models::partition_by_type;
use skinledger::rates::RateResolver;
use skinledger::reports::{Period, ProfitReport, TradeLedger};

/// Route a parsed command line to its handler
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let json_output = cli.json;

    match cli.command {
        Commands::Match {
            transactions,
            unmatched,
        } => dispatch_match(&settings, &transactions, unmatched, json_output),
        Commands::Inventory {
            inventory,
            transactions,
        } => dispatch_inventory(&inventory, &transactions, json_output),
        Commands::Profit {
            transactions,
            month,
            currency,
        } => {
            let currency = currency.unwrap_or_else(|| settings.reporting_currency.clone());
            dispatch_profit(&settings, &transactions, month.as_deref(), &currency, json_output)
                .await
        }
        Commands::Ledger {
            transactions,
            month,
            currency,
            pivot,
        } => {
            let target = currency.unwrap_or_else(|| settings.reporting_currency.clone());
            let pivot = pivot.unwrap_or_else(|| settings.pivot_currency.clone());
            dispatch_ledger(
                &settings,
                &transactions,
                month.as_deref(),
                &pivot,
                &target,
                json_output,
            )
            .await
        }
        Commands::Rates {
            base,
            quote,
            start,
            end,
        } => dispatch_rates(&settings, &base, &quote, &start, &end, json_output).await,
    }
}

fn parse_period(month: Option<&str>) -> Result<Period> {
    match month {
        Some(m) => Period::parse_month(m),
        None => Period::current_month(),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}' (expected YYYY-MM-DD)", value))
}

/// Spinner on stderr while rates are fetched; hidden for JSON output.
fn rate_spinner(message: &str, json_output: bool) -> ProgressBar {
    if json_output {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn reconcile(settings: &Settings, path: &Path) -> Result<Vec<skinledger::matching::Match>> {
    let transactions = load_transactions(path)?;
    let (sales, buys) = partition_by_type(&transactions);
    info!("Reconciling {} sales against {} buys", sales.len(), buys.len());
    Ok(Reconciler::new(settings.stable_asset_source.clone()).match_transactions(&sales, &buys))
}

fn dispatch_match(settings: &Settings, path: &Path, unmatched_only: bool, json_output: bool) -> Result<()> {
    let mut matches = reconcile(settings, path)?;
    if unmatched_only {
        matches.retain(|m| !m.is_matched());
    }

    if json_output {
        println!("{}", formatters::format_json(&matches));
    } else if matches.is_empty() {
        print!("{}", formatters::format_empty("sales"));
    } else {
        print!("{}", formatters::format_matches_table(&matches));
    }
    Ok(())
}

fn dispatch_inventory(inventory_path: &Path, transactions_path: &Path, json_output: bool) -> Result<()> {
    let inventory = load_inventory(inventory_path)?;
    let transactions = load_transactions(transactions_path)?;
    let (_, buys) = partition_by_type(&transactions);
    let valued = match_inventory(&inventory, &buys);

    if json_output {
        println!("{}", formatters::format_json(&valued));
    } else if valued.is_empty() {
        print!("{}", formatters::format_empty("inventory items"));
    } else {
        print!("{}", formatters::format_inventory_table(&valued));
    }
    Ok(())
}

async fn dispatch_profit(
    settings: &Settings,
    path: &Path,
    month: Option<&str>,
    currency: &str,
    json_output: bool,
) -> Result<()> {
    let period = parse_period(month)?;
    let matches = reconcile(settings, path)?;
    let resolver =
        RateResolver::from_settings(&settings.rates).context("Failed to set up rate providers")?;

    let spinner = rate_spinner(&format!("Fetching exchange rates for {}...", period), json_output);
    let report = ProfitReport::build(&resolver, &matches, currency, period).await;
    spinner.finish_and_clear();

    if json_output {
        println!("{}", formatters::format_json(&report));
    } else if report.rows.is_empty() {
        print!("{}", formatters::format_empty(&format!("sales in {}", period)));
    } else {
        print!("{}", formatters::format_profit_report(&report));
    }
    Ok(())
}

async fn dispatch_ledger(
    settings: &Settings,
    path: &Path,
    month: Option<&str>,
    pivot: &str,
    target: &str,
    json_output: bool,
) -> Result<()> {
    let period = parse_period(month)?;
    let transactions = load_transactions(path)?;
    let resolver =
        RateResolver::from_settings(&settings.rates).context("Failed to set up rate providers")?;

    let spinner = rate_spinner(&format!("Fetching exchange rates for {}...", period), json_output);
    let ledger = TradeLedger::build(&resolver, &transactions, period, pivot, target).await;
    spinner.finish_and_clear();

    if json_output {
        println!("{}", formatters::format_json(&ledger));
    } else if ledger.buys.is_empty() && ledger.sales.is_empty() {
        print!("{}", formatters::format_empty(&format!("transactions in {}", period)));
    } else {
        print!("{}", formatters::format_ledger(&ledger));
    }
    Ok(())
}

async fn dispatch_rates(
    settings: &Settings,
    base: &str,
    quote: &str,
    start: &str,
    end: &str,
    json_output: bool,
) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if start > end {
        return Err(anyhow!("--from {} is after --to {}", start, end));
    }
    let base = base.trim().to_uppercase();
    let quote = quote.trim().to_uppercase();

    let resolver =
        RateResolver::from_settings(&settings.rates).context("Failed to set up rate providers")?;
    let spinner = rate_spinner(&format!("Fetching {}/{} rates...", base, quote), json_output);
    let table = resolver.resolve(&base, &quote, start, end).await;
    spinner.finish_and_clear();

    if json_output {
        println!("{}", formatters::format_json(&table));
    } else {
        print!("{}", formatters::format_rates_table(&table, &base, &quote));
    }
    Ok(())
}
