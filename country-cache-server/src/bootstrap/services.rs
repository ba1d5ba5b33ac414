use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::adapters::outbound::artifacts::FileArtifactStore;
use crate::adapters::outbound::persistence::Database;
use crate::adapters::outbound::rendering::PngRenderer;
use crate::adapters::outbound::sources::HttpCountrySource;
use crate::application::{
    CountryService, RefreshOrchestrator, RefreshScheduler, SummaryArtifactBuilder,
};
use crate::domain::services::{GdpEstimator, Normalizer, RandomMultiplierEstimator};
use crate::ports;

pub struct ServiceRegistry {
    pub db: Arc<Database>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub countries: Arc<CountryService>,
    pub artifacts: Arc<dyn ports::ArtifactStore>,
    pub scheduler: Option<JoinHandle<()>>,
}

pub async fn setup(config: &crate::config::Config) -> Result<ServiceRegistry> {
    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database.url.clone());
    let db = Arc::new(
        Database::with_max_connections(&database_url, config.database.max_connections).await?,
    );
    tracing::info!("Database initialized: {}", database_url);

    assemble(config, db)
}

/// Wire every component around an open store.
pub fn assemble(config: &crate::config::Config, db: Arc<Database>) -> Result<ServiceRegistry> {
    let repository = db.clone() as Arc<dyn ports::CountryRepository>;

    let estimator = RandomMultiplierEstimator::new(
        config.estimator.min_multiplier,
        config.estimator.max_multiplier,
    );
    let (min, max) = estimator.bounds();
    tracing::info!(min, max, "GDP estimator multiplier range");
    let estimator: Arc<dyn GdpEstimator> = Arc::new(estimator);

    let source = Arc::new(HttpCountrySource::new(&config.sources)?);
    let artifacts = Arc::new(FileArtifactStore::new(&config.artifact.path));
    tracing::info!("Summary artifact path: {}", artifacts.path().display());
    let artifacts = artifacts as Arc<dyn ports::ArtifactStore>;

    let orchestrator = Arc::new(RefreshOrchestrator::new(
        source as Arc<dyn ports::CountrySource>,
        repository.clone(),
        Normalizer::new(estimator.clone()),
        SummaryArtifactBuilder::new(Arc::new(PngRenderer::new())),
        artifacts.clone(),
        config.refresh.on_conflict,
        config.refresh.store_timeout(),
    ));
    tracing::info!(
        on_conflict = ?config.refresh.on_conflict,
        store_timeout_secs = config.refresh.store_timeout_secs,
        "Refresh orchestrator initialized"
    );

    let countries = Arc::new(CountryService::new(repository, estimator));

    let scheduler = RefreshScheduler::new(
        orchestrator.clone(),
        config.refresh.interval(),
        config.refresh.on_startup,
    )
    .spawn();
    if scheduler.is_some() {
        tracing::info!("Refresh scheduler task spawned");
    }

    Ok(ServiceRegistry {
        db,
        orchestrator,
        countries,
        artifacts,
        scheduler,
    })
}
