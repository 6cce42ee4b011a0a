/// `load_config` module: builds the process-wide [`Settings`] from an optional
/// YAML file and the environment.
///
/// This is the only place that reads configuration. Everything downstream gets
/// explicit value objects (`SourceConfig`, `IngestionConfig`,
/// `SynchroniseConfig`) derived from [`Settings`].
///
/// # Sources, lowest precedence first
/// 1. Built-in defaults.
/// 2. The YAML file given with `--config` (non-secret keys only).
/// 3. Environment variables, including those loaded from `.env`.
///
/// Secrets (`DOCCLE_USERNAME`, `DOCCLE_PASSWORD`, `PAPERLESS_URL`,
/// `PAPERLESS_TOKEN`) are only read from the environment and only checked when
/// a command asks for the config that needs them.
///
/// # Errors
/// File and parse problems, and malformed numeric values, are `anyhow` errors
/// surfaced at the CLI boundary. Missing secrets are `ConfigError`s.
use anyhow::Result;
use doccle_sync_core::config::{
    IngestionConfig, SourceConfig, SynchroniseConfig, DEFAULT_HTTP_TIMEOUT,
    DEFAULT_SOURCE_BASE_URL,
};
use doccle_sync_core::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3600);
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloaded_documents";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_HEALTH_BIND: &str = "0.0.0.0:8080";

/// Non-secret keys accepted in the YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub download_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub poll_interval_seconds: Option<u64>,
    pub max_documents: Option<u32>,
    pub source_base_url: Option<String>,
    pub health_bind: Option<String>,
    pub http_timeout_seconds: Option<u64>,
}

#[derive(Clone)]
pub struct Settings {
    pub download_dir: PathBuf,
    pub log_dir: PathBuf,
    pub poll_interval: Duration,
    pub max_documents: Option<u32>,
    pub source_base_url: String,
    pub health_bind: String,
    pub http_timeout: Duration,
    doccle_username: Option<String>,
    doccle_password: Option<String>,
    paperless_url: Option<String>,
    paperless_token: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("download_dir", &self.download_dir)
            .field("log_dir", &self.log_dir)
            .field("poll_interval", &self.poll_interval)
            .field("max_documents", &self.max_documents)
            .field("source_base_url", &self.source_base_url)
            .field("health_bind", &self.health_bind)
            .field("http_timeout", &self.http_timeout)
            .field("doccle_username", &self.doccle_username)
            .field("doccle_password_set", &self.doccle_password.is_some())
            .field("paperless_url", &self.paperless_url)
            .field("paperless_token_set", &self.paperless_token.is_some())
            .finish()
    }
}

impl Settings {
    /// Credentials and endpoint for the document-delivery service.
    pub fn source_config(&self) -> Result<SourceConfig, ConfigError> {
        let username = self
            .doccle_username
            .clone()
            .ok_or(ConfigError::Missing("DOCCLE_USERNAME"))?;
        let password = self
            .doccle_password
            .clone()
            .ok_or(ConfigError::Missing("DOCCLE_PASSWORD"))?;
        Ok(SourceConfig {
            base_url: self.source_base_url.clone(),
            username,
            password,
            timeout: self.http_timeout,
        })
    }

    /// Endpoint and token for the ingestion service.
    pub fn ingestion_config(&self) -> Result<IngestionConfig, ConfigError> {
        let base_url = self
            .paperless_url
            .clone()
            .ok_or(ConfigError::Missing("PAPERLESS_URL"))?;
        let token = self
            .paperless_token
            .clone()
            .ok_or(ConfigError::Missing("PAPERLESS_TOKEN"))?;
        Ok(IngestionConfig {
            base_url,
            token,
            timeout: self.http_timeout,
        })
    }

    pub fn synchronise_config(&self) -> SynchroniseConfig {
        SynchroniseConfig {
            download_dir: self.download_dir.clone(),
            max_documents: self.max_documents,
        }
    }
}

/// Reads a variable, treating an empty value as unset.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_number<T>(name: &'static str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_value(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| {
            error!(var = name, raw = %raw, error = %e, "Environment variable must be a number");
            ConfigError::Invalid {
                name,
                reason: format!("{raw:?} is not a valid number: {e}"),
            }
            .into()
        }),
    }
}

fn positive_seconds(name: &'static str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".into(),
        }
        .into());
    }
    Ok(Duration::from_secs(secs))
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;
    // An empty file is a valid "all defaults" configuration.
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })
}

/// The log directory with the same precedence as [`load_config`], resolved
/// before tracing is installed. Never fails: an unreadable or invalid file
/// falls back to the default and is reported by [`load_config`] afterwards.
pub fn resolve_log_dir(path: Option<&Path>) -> PathBuf {
    env_value("LOG_DIR")
        .map(PathBuf::from)
        .or_else(|| {
            path.and_then(|p| fs::read_to_string(p).ok())
                .and_then(|content| serde_yaml::from_str::<FileConfig>(&content).ok())
                .and_then(|file| file.log_dir)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

/// Load [`Settings`] from the optional YAML file and the environment.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(p) => read_file_config(p)?,
        None => FileConfig::default(),
    };

    let poll_secs = env_number::<u64>("POLL_INTERVAL_SECONDS")?
        .or(file.poll_interval_seconds)
        .unwrap_or(DEFAULT_POLL_INTERVAL.as_secs());
    let timeout_secs = env_number::<u64>("HTTP_TIMEOUT_SECONDS")?
        .or(file.http_timeout_seconds)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT.as_secs());
    let max_documents = env_number::<u32>("DOCCLE_MAX_DOCUMENTS")?
        .or(file.max_documents)
        .filter(|n| *n > 0);

    let settings = Settings {
        download_dir: env_value("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .or(file.download_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
        log_dir: env_value("LOG_DIR")
            .map(PathBuf::from)
            .or(file.log_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        poll_interval: positive_seconds("POLL_INTERVAL_SECONDS", poll_secs)?,
        max_documents,
        source_base_url: env_value("DOCCLE_BASE_URL")
            .or(file.source_base_url)
            .unwrap_or_else(|| DEFAULT_SOURCE_BASE_URL.to_string()),
        health_bind: env_value("HEALTH_BIND")
            .or(file.health_bind)
            .unwrap_or_else(|| DEFAULT_HEALTH_BIND.to_string()),
        http_timeout: positive_seconds("HTTP_TIMEOUT_SECONDS", timeout_secs)?,
        doccle_username: env_value("DOCCLE_USERNAME"),
        doccle_password: env_value("DOCCLE_PASSWORD"),
        paperless_url: env_value("PAPERLESS_URL"),
        paperless_token: env_value("PAPERLESS_TOKEN"),
    };

    info!(
        download_dir = %settings.download_dir.display(),
        log_dir = %settings.log_dir.display(),
        poll_interval_secs = settings.poll_interval.as_secs(),
        doccle_credentials_set = settings.doccle_username.is_some() && settings.doccle_password.is_some(),
        paperless_set = settings.paperless_url.is_some() && settings.paperless_token.is_some(),
        "Config loaded and merged successfully"
    );
    Ok(settings)
}
