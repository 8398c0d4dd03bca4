use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::info;

use super::provider::{CrossRateProvider, RateError, RatePayload};

pub const FRANKFURTER_BASE_URL: &str = "https://api.frankfurter.dev/v1";
const PROVIDER_ID: &str = "FRANKFURTER";

/// Currencies published by the ECB reference feed.
const SUPPORTED_CURRENCIES: &[&str] = &[
    "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF", "IDR",
    "ILS", "INR", "ISK", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP", "PLN", "RON", "SEK",
    "SGD", "THB", "TRY", "USD", "ZAR",
];

/// Frankfurter time-series response
#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    rates: Option<BTreeMap<String, HashMap<String, f64>>>,
}

pub(crate) fn decode_grid(body: &str) -> Result<RatePayload, RateError> {
    let data: FrankfurterResponse =
        serde_json::from_str(body).map_err(|e| RateError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;
    Ok(RatePayload::Grid(data.rates.unwrap_or_default()))
}

/// ECB reference rates via frankfurter.dev
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("skinledger/0.1 (exchange rates)")
            .timeout(timeout)
            .build()
            .context("Failed to build Frankfurter HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn series_url(&self, base: &str, symbols: &[String], start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/{}..{}?from={}&to={}",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            base,
            symbols.join(",")
        )
    }
}

#[async_trait]
impl CrossRateProvider for FrankfurterProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn supports(&self, currency: &str) -> bool {
        SUPPORTED_CURRENCIES.contains(&currency)
    }

    async fn fetch(
        &self,
        base: &str,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RatePayload, RateError> {
        if let Some(unsupported) = std::iter::once(base)
            .chain(symbols.iter().map(String::as_str))
            .find(|c| !self.supports(c))
        {
            return Err(RateError::Unsupported {
                provider: PROVIDER_ID.to_string(),
                currency: unsupported.to_string(),
            });
        }

        let url = self.series_url(base, symbols, start, end);
        info!(
            "Fetching {} per {} from Frankfurter ({} to {})",
            symbols.join(","),
            base,
            start,
            end
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Network {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RateError::Status {
                provider: PROVIDER_ID.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| RateError::Network {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;
        decode_grid(&body)
    }
}
