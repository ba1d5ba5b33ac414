use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::refresh_service::RefreshOrchestrator;
use crate::errors::CycleError;

/// Background trigger for periodic refresh cycles.
pub struct RefreshScheduler {
    orchestrator: Arc<RefreshOrchestrator>,
    interval: Option<Duration>,
    on_startup: bool,
}

impl RefreshScheduler {
    pub fn new(
        orchestrator: Arc<RefreshOrchestrator>,
        interval: Option<Duration>,
        on_startup: bool,
    ) -> Self {
        Self {
            orchestrator,
            interval,
            on_startup,
        }
    }

    /// Spawn the scheduler task, or return `None` when there is nothing to schedule.
    pub fn spawn(self) -> Option<JoinHandle<()>> {
        if self.interval.is_none() && !self.on_startup {
            return None;
        }
        Some(tokio::spawn(self.run()))
    }

    async fn run(self) {
        if self.on_startup {
            tracing::info!("Running startup refresh");
            self.tick().await;
        }

        let Some(period) = self.interval else {
            return;
        };
        tracing::info!(interval_secs = period.as_secs(), "Periodic refresh enabled");

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    async fn tick(&self) {
        match self.orchestrator.try_run_cycle().await {
            Ok(report) => tracing::debug!(cycle_id = %report.cycle_id, "Scheduled refresh finished"),
            Err(CycleError::InProgress) => {
                tracing::info!("Scheduled refresh skipped, a cycle is already running")
            }
            Err(e) => tracing::warn!(error = %e, "Scheduled refresh failed"),
        }
    }
}
