use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 { 10_000 }
fn default_health_timeout_ms() -> u64 { 5_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "warn".to_string() }
fn default_log_format() -> String { "compact".to_string() }

/// Where local storage lives when nothing is configured
pub fn default_storage_path() -> String {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => format!("{}/.moy-risk/storage.json", home),
        _ => ".moy-risk/storage.json".to_string(),
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Built-in defaults
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MOYRISK_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("storage.path", default_storage_path())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MOYRISK__API__BASE_URL -> api.base_url
            .add_source(
                Environment::with_prefix("MOYRISK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("storage.path", default_storage_path())?
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MOYRISK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }
}

/// Short-form environment overrides that win over everything else
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    if let Ok(base_url) = std::env::var("API_BASE_URL") {
        builder = builder.set_override("api.base_url", base_url)?;
    }
    if let Ok(path) = std::env::var("MOYRISK_STORAGE") {
        builder = builder.set_override("storage.path", path)?;
    }

    builder.build()
}
