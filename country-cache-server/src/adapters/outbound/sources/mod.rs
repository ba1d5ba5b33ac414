//! HTTP client for the country directory and exchange-rate sources.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::SourcesConfig;
use crate::domain::models::RateTable;
use crate::errors::SourceError;
use crate::ports::CountrySource;

pub const DIRECTORY_SOURCE: &str = "Countries API";
pub const RATES_SOURCE: &str = "Exchange Rates API";

/// Response shape of the exchange-rate endpoint.
#[derive(Debug, Deserialize)]
struct RatesDocument {
    #[serde(default)]
    result: Option<String>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
    #[serde(rename = "base_code", alias = "base", default)]
    base: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
}

pub struct HttpCountrySource {
    client: reqwest::Client,
    countries_url: String,
    rates_url: String,
    timeout: Duration,
}

impl HttpCountrySource {
    pub fn new(config: &SourcesConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("country-cache-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            countries_url: config.countries_url.clone(),
            rates_url: config.rates_url.clone(),
            timeout: config.timeout(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        source_name: &str,
        url: &str,
    ) -> Result<T, SourceError> {
        let fetch = async {
            let response = self.client.get(url).send().await.map_err(|e| {
                if e.is_timeout() {
                    self.timeout_error(source_name)
                } else {
                    SourceError::Request {
                        source_name: source_name.to_string(),
                        detail: e.to_string(),
                    }
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    source_name: source_name.to_string(),
                    status: status.as_u16(),
                });
            }

            response.json::<T>().await.map_err(|e| SourceError::Decode {
                source_name: source_name.to_string(),
                detail: e.to_string(),
            })
        };

        tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| self.timeout_error(source_name))?
    }

    fn timeout_error(&self, source_name: &str) -> SourceError {
        SourceError::Timeout {
            source_name: source_name.to_string(),
            timeout_secs: self.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl CountrySource for HttpCountrySource {
    async fn fetch_directory(&self) -> Result<Vec<serde_json::Value>, SourceError> {
        let entries: Vec<serde_json::Value> =
            self.get_json(DIRECTORY_SOURCE, &self.countries_url).await?;
        tracing::debug!(count = entries.len(), "Fetched country directory");
        Ok(entries)
    }

    async fn fetch_rates(&self) -> Result<RateTable, SourceError> {
        let document: RatesDocument = self.get_json(RATES_SOURCE, &self.rates_url).await?;

        if let Some(result) = document.result.as_deref() {
            if result != "success" {
                return Err(SourceError::Rejected {
                    source_name: RATES_SOURCE.to_string(),
                    detail: document.error_type.unwrap_or_else(|| result.to_string()),
                });
            }
        }

        let rates = document.rates.ok_or_else(|| SourceError::Decode {
            source_name: RATES_SOURCE.to_string(),
            detail: "response has no rates".to_string(),
        })?;

        let table = RateTable::new(document.base.unwrap_or_default(), rates);
        tracing::debug!(base = %table.base, count = table.len(), "Fetched exchange rates");
        Ok(table)
    }
}
