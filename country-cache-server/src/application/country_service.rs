//! Direct client writes to the cache.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::domain::models::CountryRecord;
use crate::domain::services::{estimate_gdp, GdpEstimator};
use crate::errors::{ValidationError, WriteError};
use crate::ports::CountryRepository;

/// Largest population the store can hold.
const MAX_POPULATION: u64 = i64::MAX as u64;

pub struct CountryService {
    repository: Arc<dyn CountryRepository>,
    estimator: Arc<dyn GdpEstimator>,
}

impl CountryService {
    pub fn new(repository: Arc<dyn CountryRepository>, estimator: Arc<dyn GdpEstimator>) -> Self {
        Self {
            repository,
            estimator,
        }
    }

    /// Validate `input` and upsert it as a fresh record.
    ///
    /// Every invalid field is reported at once and nothing is written.
    /// `estimated_gdp` is always derived; a caller-supplied value is ignored.
    pub async fn create_or_overwrite(&self, input: &Value) -> Result<CountryRecord, WriteError> {
        let fields = validate(input)?;

        let estimated_gdp =
            estimate_gdp(self.estimator.as_ref(), fields.population, fields.exchange_rate);
        let record = CountryRecord {
            name: fields.name,
            capital: fields.capital,
            region: fields.region,
            population: fields.population,
            currency_code: Some(fields.currency_code),
            exchange_rate: fields.exchange_rate,
            estimated_gdp,
            flag_url: fields.flag_url,
            last_refreshed_at: Utc::now(),
        };

        self.repository.upsert(&record).await?;
        tracing::info!(country = %record.name, "Country written by client");

        // The stored timestamp may be later than ours if a newer write already landed
        Ok(self
            .repository
            .get(&record.name)
            .await?
            .unwrap_or(record))
    }
}

struct ValidFields {
    name: String,
    capital: Option<String>,
    region: Option<String>,
    population: u64,
    currency_code: String,
    exchange_rate: Option<f64>,
    flag_url: Option<String>,
}

fn validate(input: &Value) -> Result<ValidFields, ValidationError> {
    let mut errors = ValidationError::default();
    let empty = Map::new();
    let body = match input.as_object() {
        Some(body) => body,
        None => {
            errors.push("body", "must be a JSON object");
            &empty
        }
    };

    let name = match body.get("name") {
        None | Some(Value::Null) => {
            errors.push("name", "is required");
            None
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::String(_)) => {
            errors.push("name", "must not be blank");
            None
        }
        Some(_) => {
            errors.push("name", "must be a string");
            None
        }
    };

    let population = match body.get("population") {
        None | Some(Value::Null) => {
            errors.push("population", "is required");
            None
        }
        Some(value) => match value.as_u64() {
            Some(population) if population <= MAX_POPULATION => Some(population),
            Some(_) => {
                errors.push("population", "exceeds the storable range");
                None
            }
            None => {
                errors.push("population", "must be a non-negative integer");
                None
            }
        },
    };

    let currency_code = match body.get("currency_code") {
        None | Some(Value::Null) => {
            errors.push("currency_code", "is required");
            None
        }
        Some(Value::String(code))
            if code.trim().len() == 3 && code.trim().chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            Some(code.trim().to_ascii_uppercase())
        }
        Some(_) => {
            errors.push("currency_code", "must be a 3-letter currency code");
            None
        }
    };

    let exchange_rate = match body.get("exchange_rate") {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_f64() {
            Some(rate) if rate.is_finite() && rate > 0.0 => Some(rate),
            _ => {
                errors.push("exchange_rate", "must be a positive number");
                None
            }
        },
    };

    let capital = optional_string(body, "capital", &mut errors);
    let region = optional_string(body, "region", &mut errors);
    let flag_url = optional_string(body, "flag_url", &mut errors);

    match (name, population, currency_code) {
        (Some(name), Some(population), Some(currency_code)) if errors.is_empty() => {
            Ok(ValidFields {
                name,
                capital,
                region,
                population,
                currency_code,
                exchange_rate,
                flag_url,
            })
        }
        _ => Err(errors),
    }
}

fn optional_string(
    body: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationError,
) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(_) => {
            errors.push(field, "must be a string");
            None
        }
    }
}
