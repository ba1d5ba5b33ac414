use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::models::{CountryRecord, SummaryArtifact};
use crate::domain::services::summary::{summary_layout, top_by_gdp, TOP_N};
use crate::errors::RenderError;
use crate::ports::Renderer;

/// Builds the summary artifact of a refresh cycle.
pub struct SummaryArtifactBuilder {
    renderer: Arc<dyn Renderer>,
}

impl SummaryArtifactBuilder {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    /// Rank, lay out and render `records`. Rendering runs on the blocking pool.
    pub async fn build(
        &self,
        records: &[CountryRecord],
        generated_at: DateTime<Utc>,
    ) -> Result<SummaryArtifact, RenderError> {
        let top = top_by_gdp(records, TOP_N);
        let layout = summary_layout(records.len(), generated_at, &top);

        let renderer = self.renderer.clone();
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&layout))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))??;

        Ok(SummaryArtifact {
            total_count: records.len(),
            generated_at,
            top,
            bytes,
        })
    }
}
