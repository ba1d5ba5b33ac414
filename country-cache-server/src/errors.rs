//! Error taxonomy for the refresh pipeline and the store.

use std::collections::BTreeMap;
use thiserror::Error;

/// An external data source could not be used for this cycle.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("{source_name} request failed: {detail}")]
    Request { source_name: String, detail: String },

    #[error("{source_name} responded with status {status}")]
    Status { source_name: String, status: u16 },

    #[error("{source_name} payload could not be decoded: {detail}")]
    Decode { source_name: String, detail: String },

    #[error("{source_name} reported an error result: {detail}")]
    Rejected { source_name: String, detail: String },

    #[error("{source_name} did not respond within {timeout_secs}s")]
    Timeout {
        source_name: String,
        timeout_secs: u64,
    },
}

impl SourceError {
    pub fn source_name(&self) -> &str {
        match self {
            SourceError::Request { source_name, .. }
            | SourceError::Status { source_name, .. }
            | SourceError::Decode { source_name, .. }
            | SourceError::Rejected { source_name, .. }
            | SourceError::Timeout { source_name, .. } => source_name,
        }
    }
}

/// A single directory entry could not become a cache record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordProcessingError {
    #[error("entry has no name")]
    MissingName,

    #[error("entry is malformed: {detail}")]
    Malformed {
        name: Option<String>,
        detail: String,
    },
}

/// A direct client write was rejected before touching the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields.insert(field.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        write!(f, "validation failed for: {}", names.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Failures of the persistent store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The row violated a schema constraint. Only this record is affected.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store unit of work exceeded {0}s deadline")]
    Timeout(u64),

    #[error("stored row is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether the error is confined to one record and the batch may continue.
    pub fn is_record_level(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    StoreError::Constraint(db_err.message().to_string())
                }
                _ => StoreError::Unavailable(err.to_string()),
            },
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(err.to_string())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("canvas error: {0}")]
    Canvas(String),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("render task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a refresh cycle did not complete.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("external data source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("a refresh cycle is already in progress")]
    InProgress,

    #[error("refresh task did not complete: {0}")]
    Interrupted(String),
}

/// Why a direct client write did not complete.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
