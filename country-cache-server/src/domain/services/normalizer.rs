use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::models::{CountryRecord, RateTable, RawCountry};
use crate::domain::services::estimator::{estimate_gdp, GdpEstimator};
use crate::errors::RecordProcessingError;

/// Turns raw directory entries into cache records.
#[derive(Clone)]
pub struct Normalizer {
    estimator: Arc<dyn GdpEstimator>,
}

impl Normalizer {
    pub fn new(estimator: Arc<dyn GdpEstimator>) -> Self {
        Self { estimator }
    }

    pub fn normalize(
        &self,
        raw: &RawCountry,
        rates: &RateTable,
        refreshed_at: DateTime<Utc>,
    ) -> Result<CountryRecord, RecordProcessingError> {
        let name = non_blank(raw.name.as_deref()).ok_or(RecordProcessingError::MissingName)?;
        let population = raw.population.unwrap_or(0);

        let currency_code = raw.first_currency_code().map(str::to_ascii_uppercase);
        let exchange_rate = currency_code
            .as_deref()
            .and_then(|code| rates.rate_for(code));
        let estimated_gdp = estimate_gdp(self.estimator.as_ref(), population, exchange_rate);

        Ok(CountryRecord {
            name,
            capital: non_blank(raw.capital.as_deref()),
            region: non_blank(raw.region.as_deref()),
            population,
            currency_code,
            exchange_rate,
            estimated_gdp,
            flag_url: non_blank(raw.flag.as_deref()),
            last_refreshed_at: refreshed_at,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::estimator::{FixedMultiplierEstimator, RandomMultiplierEstimator};
    use serde_json::json;
    use std::collections::HashMap;

    fn rates() -> RateTable {
        RateTable::new("USD", HashMap::from([("WON".to_string(), 2.5)]))
    }

    fn raw(value: serde_json::Value) -> RawCountry {
        RawCountry::from_json(value).unwrap()
    }

    fn fixed() -> Normalizer {
        Normalizer::new(Arc::new(FixedMultiplierEstimator(1000.0)))
    }

    #[test]
    fn test_normalize_with_known_rate() {
        let now = Utc::now();
        let record = fixed()
            .normalize(
                &raw(json!({
                    "name": "Wonderland",
                    "capital": "Queenstown",
                    "region": "Fiction",
                    "population": 1_000_000,
                    "flag": "https://flags.example/won.svg",
                    "currencies": [{"code": "WON"}]
                })),
                &rates(),
                now,
            )
            .unwrap();

        assert_eq!(record.name, "Wonderland");
        assert_eq!(record.capital.as_deref(), Some("Queenstown"));
        assert_eq!(record.currency_code.as_deref(), Some("WON"));
        assert_eq!(record.exchange_rate, Some(2.5));
        assert_eq!(record.estimated_gdp, Some(400_000_000.0));
        assert_eq!(record.flag_url.as_deref(), Some("https://flags.example/won.svg"));
        assert_eq!(record.last_refreshed_at, now);
    }

    #[test]
    fn test_no_currency_leaves_derived_fields_absent() {
        let record = fixed()
            .normalize(
                &raw(json!({"name": "Noland", "population": 500_000, "currencies": []})),
                &rates(),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(record.currency_code, None);
        assert_eq!(record.exchange_rate, None);
        assert_eq!(record.estimated_gdp, None);
    }

    #[test]
    fn test_unknown_rate_does_not_default_to_one() {
        let record = fixed()
            .normalize(
                &raw(json!({"name": "Elsewhere", "population": 10, "currencies": [{"code": "ZZZ"}]})),
                &rates(),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(record.currency_code.as_deref(), Some("ZZZ"));
        assert_eq!(record.exchange_rate, None);
        assert_eq!(record.estimated_gdp, None);
    }

    #[test]
    fn test_zero_population_has_no_estimate() {
        let record = fixed()
            .normalize(
                &raw(json!({"name": "Empty Isle", "currencies": [{"code": "WON"}]})),
                &rates(),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(record.population, 0);
        assert_eq!(record.exchange_rate, Some(2.5));
        assert_eq!(record.estimated_gdp, None);
    }

    #[test]
    fn test_missing_or_blank_name_is_rejected() {
        let normalizer = fixed();
        assert_eq!(
            normalizer.normalize(&raw(json!({"population": 5})), &rates(), Utc::now()),
            Err(RecordProcessingError::MissingName)
        );
        assert_eq!(
            normalizer.normalize(&raw(json!({"name": "  "})), &rates(), Utc::now()),
            Err(RecordProcessingError::MissingName)
        );
    }

    #[test]
    fn test_nullability_law_over_mixed_inputs() {
        let normalizer = Normalizer::new(Arc::new(RandomMultiplierEstimator::default()));
        let table = RateTable::new(
            "USD",
            HashMap::from([("AAA".to_string(), 1.7), ("BBB".to_string(), 0.0)]),
        );

        for population in [0u64, 1, 42_000] {
            for code in [None, Some("AAA"), Some("BBB"), Some("CCC")] {
                let currencies = code.map(|c| json!([{"code": c}])).unwrap_or(json!([]));
                let record = normalizer
                    .normalize(
                        &raw(json!({"name": "X", "population": population, "currencies": currencies})),
                        &table,
                        Utc::now(),
                    )
                    .unwrap();

                let expected = population > 0 && record.exchange_rate.is_some_and(|r| r > 0.0);
                assert_eq!(record.estimated_gdp.is_some(), expected, "{record:?}");
            }
        }
    }
}
