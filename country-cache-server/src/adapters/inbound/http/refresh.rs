use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AppState, ProblemDetails};
use crate::domain::models::{CycleReport, CyclePhase};

/// Cache totals and the state of the refresh pipeline.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub refresh_phase: String,
}

#[tracing::instrument(name = "trigger_refresh", skip(state))]
pub async fn trigger_refresh(
    State(state): State<AppState>,
) -> Result<Json<CycleReport>, ProblemDetails> {
    match state.orchestrator.run_cycle().await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            tracing::warn!(error = %e, "Refresh request failed");
            Err(e.into())
        }
    }
}

#[tracing::instrument(name = "get_status", skip(state))]
pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ProblemDetails> {
    let phase: CyclePhase = state.orchestrator.phase();

    let stats = async {
        let total = state.repository.count().await?;
        let last = state.repository.most_recent_refresh().await?;
        Ok::<_, crate::errors::StoreError>((total, last))
    };

    match stats.await {
        Ok((total_countries, last_refreshed_at)) => Ok(Json(StatusResponse {
            total_countries,
            last_refreshed_at,
            refresh_phase: phase.to_string(),
        })),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read cache status");
            Err(e.into())
        }
    }
}
