use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Where the refresh pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Fetching,
    FetchFailed,
    Normalizing,
    Upserting,
    ArtifactBuilding,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Fetching => "fetching",
            CyclePhase::FetchFailed => "fetch_failed",
            CyclePhase::Normalizing => "normalizing",
            CyclePhase::Upserting => "upserting",
            CyclePhase::ArtifactBuilding => "artifact_building",
        }
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw entry or record that did not make it into the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub name: Option<String>,
    pub reason: String,
}

/// Summary of one completed refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub total_fetched: usize,
    pub upserted: usize,
    pub skipped: usize,
    pub skipped_records: Vec<SkippedRecord>,
    pub artifact_generated: bool,
    pub generated_at: DateTime<Utc>,
}
