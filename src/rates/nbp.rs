use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::provider::{BilateralRateProvider, Observation, RateError, RatePayload};

pub const NBP_BASE_URL: &str = "https://api.nbp.pl/api";
const PROVIDER_ID: &str = "NBP";

/// NBP table A response
#[derive(Debug, Deserialize)]
struct NbpSeriesResponse {
    rates: Option<Vec<NbpRate>>,
}

#[derive(Debug, Deserialize)]
struct NbpRate {
    #[serde(rename = "effectiveDate")]
    effective_date: String,
    mid: f64,
}

/// Decode an NBP series body into a payload.
pub(crate) fn decode_series(body: &str) -> Result<RatePayload, RateError> {
    let data: NbpSeriesResponse = serde_json::from_str(body).map_err(|e| RateError::Malformed {
        provider: PROVIDER_ID.to_string(),
        message: e.to_string(),
    })?;

    let observations = data
        .rates
        .unwrap_or_default()
        .into_iter()
        .map(|r| Observation {
            date: r.effective_date,
            value: r.mid,
        })
        .collect();
    Ok(RatePayload::Series(observations))
}

/// National Bank of Poland mid rates (every quote in PLN).
pub struct NbpProvider {
    client: Client,
    base_url: String,
}

impl NbpProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("skinledger/0.1 (exchange rates)")
            .timeout(timeout)
            .build()
            .context("Failed to build NBP HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn series_url(&self, currency: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/exchangerates/rates/a/{}/{}/{}/?format=json",
            self.base_url,
            currency.to_ascii_lowercase(),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )
    }
}

#[async_trait]
impl BilateralRateProvider for NbpProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
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
        let url = self.series_url(currency, start, end);
        info!("Fetching {} rates from NBP ({} to {})", currency, start, end);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Network {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;

        // NBP answers 404 when the range holds no publication days.
        if response.status() == StatusCode::NOT_FOUND {
            debug!("NBP has no {} rates between {} and {}", currency, start, end);
            return Ok(RatePayload::Series(Vec::new()));
        }
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
        decode_series(&body)
    }
}
