use tracing_appender::non_blocking::WorkerGuard;

use crate::logging;

pub fn setup(config: &crate::config::Config) -> Option<WorkerGuard> {
    let guard = logging::init(&config.logging);

    tracing::info!("Starting Country Cache Server...");
    tracing::info!("Server Version: {}", env!("BUILD_INFO"));

    if config.logging.enabled {
        tracing::info!(
            "File logging enabled: directory={}, prefix={}, rotation={}",
            config.logging.directory,
            config.logging.file_prefix,
            config.logging.rotation
        );
    }

    tracing::info!(
        countries_url = %config.sources.countries_url,
        rates_url = %config.sources.rates_url,
        timeout_secs = config.sources.timeout_secs,
        "External sources configured"
    );

    guard
}
