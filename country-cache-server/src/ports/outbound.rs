use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::{
    CountryFilter, CountryRecord, CountrySort, DeleteOutcome, RateTable, RecordOutcome,
    SummaryLayout,
};
use crate::errors::{ArtifactError, RenderError, SourceError, StoreError};

/// The two external data sets a refresh cycle depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Raw directory elements, decoded per entry by the caller.
    async fn fetch_directory(&self) -> Result<Vec<serde_json::Value>, SourceError>;
    async fn fetch_rates(&self) -> Result<RateTable, SourceError>;
}

/// Persistent country cache. Every `name` argument is matched case-insensitively.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountryRepository: Send + Sync {
    async fn upsert(&self, record: &CountryRecord) -> Result<(), StoreError>;

    /// Upsert all records as one unit of work.
    ///
    /// Record-level failures come back as `RecordOutcome::Skipped`; any other
    /// failure rolls the whole batch back and is returned as `Err`.
    async fn upsert_batch(
        &self,
        records: &[CountryRecord],
    ) -> Result<Vec<RecordOutcome>, StoreError>;

    async fn get(&self, name: &str) -> Result<Option<CountryRecord>, StoreError>;
    async fn delete(&self, name: &str) -> Result<DeleteOutcome, StoreError>;
    async fn list(
        &self,
        filter: &CountryFilter,
        sort: Option<CountrySort>,
    ) -> Result<Vec<CountryRecord>, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
    async fn most_recent_refresh(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Paints a summary layout into encoded image bytes.
#[cfg_attr(test, mockall::automock)]
pub trait Renderer: Send + Sync {
    fn render(&self, layout: &SummaryLayout) -> Result<Vec<u8>, RenderError>;
}

/// The single summary artifact slot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Replace the current artifact. Readers see the old or the new bytes, never a mix.
    async fn replace(&self, bytes: Vec<u8>) -> Result<(), ArtifactError>;
    async fn load(&self) -> Result<Option<Vec<u8>>, ArtifactError>;
}
