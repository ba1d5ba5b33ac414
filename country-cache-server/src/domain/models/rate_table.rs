use serde::Deserialize;
use std::collections::HashMap;

/// Exchange rates relative to a single base currency, fetched once per cycle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RateTable {
    #[serde(rename = "base_code", alias = "base", default)]
    pub base: String,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(base: impl Into<String>, rates: HashMap<String, f64>) -> Self {
        Self {
            base: base.into(),
            rates,
        }
    }

    /// Rate for `code`, only when it is a usable (finite, positive) value.
    pub fn rate_for(&self, code: &str) -> Option<f64> {
        self.rates
            .get(code)
            .or_else(|| self.rates.get(&code.to_ascii_uppercase()))
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
