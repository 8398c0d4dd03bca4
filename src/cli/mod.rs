use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "skinledger")]
#[command(
    version,
    about = "Trade reconciliation and multi-currency profit tracking for marketplace items"
)]
#[command(
    long_about = "Pair every sale with the purchase that produced it, establish cost basis for held inventory, and value profit in any currency using historical exchange rates (NBP and ECB via Frankfurter)."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Path to config.toml (defaults to $SKINLEDGER_CONFIG, then the user config dir)
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pair sales with purchases and show per-item profit in native prices
    Match {
        /// Transactions file (.json or .csv)
        transactions: PathBuf,

        /// Show only sales with no matching purchase
        #[arg(long)]
        unmatched: bool,
    },

    /// Show the cost basis of currently held items
    Inventory {
        /// Inventory file (.json or .csv)
        inventory: PathBuf,

        /// Transactions file (.json or .csv)
        transactions: PathBuf,
    },

    /// Realized profit for a month, converted to one currency
    Profit {
        /// Transactions file (.json or .csv)
        transactions: PathBuf,

        /// Month to report (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Reporting currency (defaults to reporting_currency from config)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Every buy and sale of a month, priced in pivot and target currencies
    Ledger {
        /// Transactions file (.json or .csv)
        transactions: PathBuf,

        /// Month to report (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Target currency (defaults to reporting_currency from config)
        #[arg(long)]
        currency: Option<String>,

        /// Pivot currency (defaults to pivot_currency from config)
        #[arg(long)]
        pivot: Option<String>,
    },

    /// Print historical rates of one currency in another
    Rates {
        /// Currency being priced (e.g., EUR)
        #[arg(value_name = "FROM")]
        base: String,

        /// Currency of the quote (e.g., PLN)
        #[arg(value_name = "TO")]
        quote: String,

        /// First day (YYYY-MM-DD)
        #[arg(long = "from", value_name = "DATE")]
        start: String,

        /// Last day (YYYY-MM-DD)
        #[arg(long = "to", value_name = "DATE")]
        end: String,
    },
}
