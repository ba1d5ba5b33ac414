//! Country cache records and the raw directory entries they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RecordProcessingError;

/// One cached country, keyed case-insensitively by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    /// Derived by the estimator; never accepted from callers.
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl CountryRecord {
    /// Canonical store key for this record.
    pub fn key(&self) -> String {
        canonical_key(&self.name)
    }
}

/// Canonical form of a country name used for identity comparisons.
pub fn canonical_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Currency entry in the country directory. Only the code is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrency {
    #[serde(default)]
    pub code: Option<String>,
}

/// One entry of the external country directory, decoded leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCountry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<RawCurrency>>,
}

impl RawCountry {
    /// Decode a single directory element.
    ///
    /// Elements are decoded one at a time so that a malformed entry is skipped
    /// on its own instead of failing the whole directory.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RecordProcessingError> {
        let hint = value
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        serde_json::from_value(value).map_err(|e| RecordProcessingError::Malformed {
            name: hint,
            detail: e.to_string(),
        })
    }

    /// First listed currency code, if any.
    pub fn first_currency_code(&self) -> Option<&str> {
        self.currencies
            .as_deref()?
            .first()?
            .code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Optional equality filters for listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Population,
    EstimatedGdp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountrySort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl CountrySort {
    pub const GDP_DESC: CountrySort = CountrySort {
        field: SortField::EstimatedGdp,
        direction: SortDirection::Desc,
    };

    /// Parse the query-string form (`gdp_desc`, `population_asc`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        let (field, direction) = value.trim().to_ascii_lowercase().rsplit_once('_').map(
            |(field, direction)| (field.to_string(), direction.to_string()),
        )?;

        let field = match field.as_str() {
            "gdp" | "estimated_gdp" => SortField::EstimatedGdp,
            "population" => SortField::Population,
            _ => return None,
        };
        let direction = match direction.as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return None,
        };

        Some(Self { field, direction })
    }
}

/// Result of deleting by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Per-record result of a batch upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Upserted { name: String },
    Skipped { name: String, reason: String },
}

impl RecordOutcome {
    pub fn is_upserted(&self) -> bool {
        matches!(self, RecordOutcome::Upserted { .. })
    }
}
