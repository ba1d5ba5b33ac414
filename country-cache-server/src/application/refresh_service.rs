//! Refresh cycle orchestration.
//!
//! A cycle fetches both sources, normalizes every directory entry, upserts the
//! normalized set as one batch and finally regenerates the summary artifact.
//! Only one cycle runs at a time, on its own task, so a caller that goes away
//! never leaves a committed batch without its artifact.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::Instrument;
use uuid::Uuid;

use crate::application::summary_builder::SummaryArtifactBuilder;
use crate::config::ConflictPolicy;
use crate::domain::models::{
    CountryRecord, CycleReport, CyclePhase, RawCountry, RecordOutcome, SkippedRecord,
};
use crate::domain::services::Normalizer;
use crate::errors::{CycleError, RecordProcessingError, StoreError};
use crate::ports::{ArtifactStore, CountryRepository, CountrySource};

pub struct RefreshOrchestrator {
    source: Arc<dyn CountrySource>,
    repository: Arc<dyn CountryRepository>,
    normalizer: Normalizer,
    builder: SummaryArtifactBuilder,
    artifacts: Arc<dyn ArtifactStore>,
    policy: ConflictPolicy,
    store_timeout: Duration,
    guard: Arc<Mutex<()>>,
    phase: watch::Sender<CyclePhase>,
}

/// Puts the phase back to `Idle` however the cycle ends, including cancellation.
struct IdleOnDrop<'a>(&'a watch::Sender<CyclePhase>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(CyclePhase::Idle);
    }
}

impl RefreshOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn CountrySource>,
        repository: Arc<dyn CountryRepository>,
        normalizer: Normalizer,
        builder: SummaryArtifactBuilder,
        artifacts: Arc<dyn ArtifactStore>,
        policy: ConflictPolicy,
        store_timeout: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(CyclePhase::Idle);
        Self {
            source,
            repository,
            normalizer,
            builder,
            artifacts,
            policy,
            store_timeout,
            guard: Arc::new(Mutex::new(())),
            phase,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        *self.phase.borrow()
    }

    /// Run one cycle, resolving a conflict with the configured policy.
    pub async fn run_cycle(self: &Arc<Self>) -> Result<CycleReport, CycleError> {
        self.run_with(self.policy).await
    }

    /// Run one cycle unless another one is already in flight.
    pub async fn try_run_cycle(self: &Arc<Self>) -> Result<CycleReport, CycleError> {
        self.run_with(ConflictPolicy::Reject).await
    }

    /// Resolve once no cycle is running.
    pub async fn wait_idle(&self) {
        let _permit = self.guard.lock().await;
    }

    async fn run_with(self: &Arc<Self>, policy: ConflictPolicy) -> Result<CycleReport, CycleError> {
        let permit = match policy {
            ConflictPolicy::Reject => self.guard.clone().try_lock_owned().map_err(|_| {
                tracing::warn!("Refresh rejected: a cycle is already in progress");
                CycleError::InProgress
            })?,
            ConflictPolicy::Wait => match self.guard.clone().try_lock_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::info!("Refresh queued behind the running cycle");
                    self.guard.clone().lock_owned().await
                }
            },
        };

        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("refresh_cycle", cycle_id = %cycle_id);
        let this = Arc::clone(self);
        // The task owns the permit and outlives a dropped caller
        let cycle = tokio::spawn(
            async move {
                let _permit = permit;
                this.execute(cycle_id).await
            }
            .instrument(span),
        );

        cycle.await.map_err(|e| {
            tracing::error!(cycle_id = %cycle_id, error = %e, "Refresh task did not complete");
            CycleError::Interrupted(e.to_string())
        })?
    }

    fn enter(&self, phase: CyclePhase) {
        tracing::debug!(phase = %phase, "Refresh phase");
        self.phase.send_replace(phase);
    }

    async fn execute(&self, cycle_id: Uuid) -> Result<CycleReport, CycleError> {
        let _idle = IdleOnDrop(&self.phase);
        let started = std::time::Instant::now();

        self.enter(CyclePhase::Fetching);
        let (entries, rates) =
            match tokio::try_join!(self.source.fetch_directory(), self.source.fetch_rates()) {
                Ok(fetched) => fetched,
                Err(e) => {
                    self.enter(CyclePhase::FetchFailed);
                    tracing::error!(
                        source = e.source_name(),
                        error = %e,
                        "Refresh aborted, external source unavailable"
                    );
                    return Err(e.into());
                }
            };
        let total_fetched = entries.len();
        tracing::info!(entries = total_fetched, rates = rates.len(), "Sources fetched");

        self.enter(CyclePhase::Normalizing);
        let refreshed_at = Utc::now();
        let mut records: Vec<CountryRecord> = Vec::with_capacity(total_fetched);
        let mut skipped_records = Vec::new();
        for entry in entries {
            let normalized = RawCountry::from_json(entry)
                .and_then(|raw| self.normalizer.normalize(&raw, &rates, refreshed_at));
            match normalized {
                Ok(record) => records.push(record),
                Err(e) => {
                    let name = match &e {
                        RecordProcessingError::Malformed { name, .. } => name.clone(),
                        RecordProcessingError::MissingName => None,
                    };
                    tracing::warn!(country = ?name, error = %e, "Skipping directory entry");
                    skipped_records.push(SkippedRecord {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.enter(CyclePhase::Upserting);
        let batch =
            tokio::time::timeout(self.store_timeout, self.repository.upsert_batch(&records))
                .await
                .unwrap_or_else(|_| Err(StoreError::Timeout(self.store_timeout.as_secs())));
        let outcomes = match batch {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!(error = %e, "Refresh aborted, batch rolled back");
                return Err(e.into());
            }
        };

        let mut upserted = 0;
        for outcome in outcomes {
            match outcome {
                RecordOutcome::Upserted { .. } => upserted += 1,
                RecordOutcome::Skipped { name, reason } => skipped_records.push(SkippedRecord {
                    name: Some(name),
                    reason,
                }),
            }
        }

        self.enter(CyclePhase::ArtifactBuilding);
        let artifact_generated = match self.builder.build(&records, refreshed_at).await {
            Ok(artifact) => match self.artifacts.replace(artifact.bytes).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to store summary artifact");
                    false
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to render summary artifact");
                false
            }
        };

        let report = CycleReport {
            cycle_id,
            total_fetched,
            upserted,
            skipped: skipped_records.len(),
            skipped_records,
            artifact_generated,
            generated_at: refreshed_at,
        };

        tracing::info!(
            total_fetched = report.total_fetched,
            upserted = report.upserted,
            skipped = report.skipped,
            artifact_generated = report.artifact_generated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Refresh cycle completed"
        );
        Ok(report)
    }
}
