//! User settings loaded from `config.toml`.
//!
//! Lookup order: `--config PATH`, then `$SKINLEDGER_CONFIG`, then
//! `<config home>/skinledger/config.toml`. A missing file at the default
//! location means "use defaults"; a missing file that was asked for explicitly
//! is an error.
//!
//! ```toml
//! reporting_currency = "PLN"
//! pivot_currency = "USD"
//! stable_asset_source = "DMarket"
//!
//! [rates]
//! chunk_delay_ms = 1000
//! request_timeout_secs = 30
//!
//! [[rates.pegs]]
//! currency = "AED"
//! anchor = "USD"
//! per_anchor = "3.6725"
//! ```
//!
//! A peg may instead give `multiplier`, the anchor units one `currency` unit
//! is worth. Pegs may chain (AED to SAR to USD) but must not loop.

use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::LedgerError;
use crate::matching::transactions::DEFAULT_STABLE_ASSET_SOURCE;
use crate::rates::frankfurter::FRANKFURTER_BASE_URL;
use crate::rates::nbp::NBP_BASE_URL;
use crate::rates::{default_pegs, Peg, DEFAULT_CHUNK_DELAY_MS};

pub const CONFIG_ENV: &str = "SKINLEDGER_CONFIG";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RateSettings {
    pub bilateral_base_url: String,
    pub cross_base_url: String,
    pub chunk_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub pegs: Vec<Peg>,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            bilateral_base_url: NBP_BASE_URL.to_string(),
            cross_base_url: FRANKFURTER_BASE_URL.to_string(),
            chunk_delay_ms: DEFAULT_CHUNK_DELAY_MS,
            request_timeout_secs: 30,
            pegs: default_pegs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reporting_currency: String,
    pub pivot_currency: String,
    pub stable_asset_source: String,
    pub rates: RateSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reporting_currency: "USD".to_string(),
            pivot_currency: "USD".to_string(),
            stable_asset_source: DEFAULT_STABLE_ASSET_SOURCE.to_string(),
            rates: RateSettings::default(),
        }
    }
}

/// `<config home>/skinledger/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::config_home)
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("skinledger").join(CONFIG_FILENAME))
}

fn currency_code(field: &str, value: &str) -> Result<String, LedgerError> {
    let code = value.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(LedgerError::Config(format!(
            "{} must be a 3-letter currency code, got '{}'",
            field, value
        )))
    }
}

impl Settings {
    /// Load from the explicit path, the environment override, or the default
    /// location, in that order.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match requested {
            Some(path) => {
                if !path.exists() {
                    return Err(LedgerError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    ))
                    .into());
                }
                Self::from_file(&path)
            }
            None => {
                let path = default_config_path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    debug!("No config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| LedgerError::Config(e.to_string()))?;
        Ok(settings.normalized()?)
    }

    fn normalized(mut self) -> Result<Self, LedgerError> {
        self.reporting_currency = currency_code("reporting_currency", &self.reporting_currency)?;
        self.pivot_currency = currency_code("pivot_currency", &self.pivot_currency)?;
        self.stable_asset_source = self.stable_asset_source.trim().to_string();

        for peg in &mut self.rates.pegs {
            peg.currency = currency_code("rates.pegs.currency", &peg.currency)?;
            peg.anchor = currency_code("rates.pegs.anchor", &peg.anchor)?;
            if peg.multiplier <= Decimal::ZERO {
                return Err(LedgerError::Config(format!(
                    "peg multiplier for {} must be positive",
                    peg.currency
                )));
            }
            if peg.currency == peg.anchor {
                return Err(LedgerError::Config(format!(
                    "{} cannot be pegged to itself",
                    peg.currency
                )));
            }
        }
        if let Some(currency) = self.rates.pegs.iter().map(|p| &p.currency).duplicates().next() {
            return Err(LedgerError::Config(format!("{} is pegged more than once", currency)));
        }
        for peg in &self.rates.pegs {
            if peg_loops(&self.rates.pegs, peg) {
                return Err(LedgerError::Config(format!(
                    "peg chain for {} loops back to itself",
                    peg.currency
                )));
            }
        }
        if self.rates.request_timeout_secs == 0 {
            return Err(LedgerError::Config(
                "rates.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

fn peg_loops(pegs: &[Peg], start: &Peg) -> bool {
    let mut anchor = start.anchor.as_str();
    for _ in 0..pegs.len() {
        if anchor == start.currency {
            return true;
        }
        match pegs.iter().find(|p| p.currency == anchor) {
            Some(next) => anchor = next.anchor.as_str(),
            None => return false,
        }
    }
    false
}
