use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::outbound::persistence::Database;
use crate::application::RefreshOrchestrator;

pub mod logging;
pub mod server;
pub mod services;

pub struct Application {
    pub router: Router,
    pub bind_address: String,
    pub socket_addr: SocketAddr,
    /// Store handle, closed once the server has shut down
    pub db: Arc<Database>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub scheduler: Option<JoinHandle<()>>,
    pub log_guard: Option<WorkerGuard>,
}

impl Application {
    /// Stop background work and release the store.
    pub async fn shutdown(self) {
        if let Some(scheduler) = self.scheduler {
            scheduler.abort();
        }
        // A cycle already in flight finishes against the open store
        self.orchestrator.wait_idle().await;
        self.db.close().await;
        tracing::info!("Country cache closed");
    }
}

pub async fn setup() -> Result<Application> {
    // 1. Load Configuration
    let config = load_config();

    // 2. Setup Logging
    let log_guard = logging::setup(&config);

    // 3. Setup Services & Background Tasks
    let service_registry = services::setup(&config).await?;

    // 4. Setup Server (API)
    server::setup(config, service_registry, log_guard)
}

fn load_config() -> crate::config::Config {
    use crate::config::Config;

    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_string_lossy().into_owned()))
            .unwrap_or_else(|| ".".to_string())
    });
    let config_base = format!("{}/config", config_dir);

    eprintln!(
        "Config directory: {}, config base: {}",
        config_dir, config_base
    );

    match Config::from_file(&config_base) {
        Ok(cfg) => {
            eprintln!("Configuration loaded successfully from {}", config_base);
            cfg
        }
        Err(e) => {
            eprintln!("Failed to load configuration: {}, using defaults", e);
            Config::default()
        }
    }
}
