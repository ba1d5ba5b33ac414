use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub artifact: ArtifactConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    crate::adapters::outbound::persistence::DEFAULT_MAX_CONNECTIONS
}

/// External data sources consumed by each refresh cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_countries_url")]
    pub countries_url: String,
    #[serde(default = "default_rates_url")]
    pub rates_url: String,
    /// Deadline for each fetch, including the response body
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

fn default_countries_url() -> String {
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies"
        .to_string()
}
fn default_rates_url() -> String {
    "https://open.er-api.com/v6/latest/USD".to_string()
}
fn default_source_timeout() -> u64 {
    15
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            countries_url: default_countries_url(),
            rates_url: default_rates_url(),
            timeout_secs: default_source_timeout(),
        }
    }
}

/// What a refresh trigger does while another cycle is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail immediately with a conflict
    #[default]
    Reject,
    /// Queue behind the running cycle
    Wait,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between scheduled refreshes (0 = manual only)
    #[serde(default)]
    pub interval_secs: u64,
    /// Run one cycle right after startup
    #[serde(default)]
    pub on_startup: bool,
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
    /// Deadline for the batch upsert of one cycle
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,
}

fn default_store_timeout() -> u64 {
    30
}

impl RefreshConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }

    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0,
            on_startup: false,
            on_conflict: ConflictPolicy::default(),
            store_timeout_secs: default_store_timeout(),
        }
    }
}

/// Bounds of the random multiplier used by the GDP estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default = "default_min_multiplier")]
    pub min_multiplier: u32,
    #[serde(default = "default_max_multiplier")]
    pub max_multiplier: u32,
}

fn default_min_multiplier() -> u32 {
    crate::domain::services::estimator::DEFAULT_MIN_MULTIPLIER
}
fn default_max_multiplier() -> u32 {
    crate::domain::services::estimator::DEFAULT_MAX_MULTIPLIER
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_multiplier: default_min_multiplier(),
            max_multiplier: default_max_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Location of the rendered summary image
    #[serde(default = "default_artifact_path")]
    pub path: String,
}

fn default_artifact_path() -> String {
    "cache/summary.png".to_string()
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: default_artifact_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// Disable CORS restrictions (allows all origins) - use only in development!
    #[serde(default)]
    pub disable: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable file logging
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    /// Directory for log files (relative to executable or absolute path)
    #[serde(default = "default_log_directory")]
    pub directory: String,
    /// Prefix for log file names
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Rotation strategy: "daily", "hourly", or "never"
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
    /// Maximum number of log files to keep (0 = unlimited)
    #[serde(default = "default_max_files")]
    pub max_files: u32,
    /// Maximum age of log files in days (0 = unlimited)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

fn default_logging_enabled() -> bool {
    false
}
fn default_log_directory() -> String {
    "logs".to_string()
}
fn default_log_file_prefix() -> String {
    "country-cache-server".to_string()
}
fn default_log_rotation() -> String {
    "daily".to_string()
}
fn default_max_files() -> u32 {
    14
}
fn default_max_age_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            rotation: default_log_rotation(),
            max_files: default_max_files(),
            max_age_days: default_max_age_days(),
        }
    }
}

impl Config {
    /// Load config from layered TOML files
    ///
    /// Loads configuration files in the following order (later files override earlier):
    /// 1. {base_name}.toml (required, e.g., config.toml)
    /// 2. {base_name}.{ENV}.toml (optional, only if CONFIG_ENV is set)
    /// 3. {base_name}.local.toml (optional, for personal overrides, git-ignored)
    pub fn from_file<P: AsRef<Path>>(base_name: P) -> Result<Self> {
        let base_str = base_name.as_ref().to_str().context("Invalid base path")?;

        let mut builder =
            config::Config::builder().add_source(config::File::with_name(base_str));

        if let Ok(env) = std::env::var("CONFIG_ENV") {
            let env_config = format!("{}.{}", base_str, env);
            builder = builder.add_source(config::File::with_name(&env_config).required(false));
        }

        let local_config = format!("{}.local", base_str);
        builder = builder.add_source(config::File::with_name(&local_config).required(false));

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Get server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite://countries_cache.db?mode=rwc".to_string(),
                max_connections: default_max_connections(),
            },
            sources: SourcesConfig::default(),
            refresh: RefreshConfig::default(),
            estimator: EstimatorConfig::default(),
            artifact: ArtifactConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
