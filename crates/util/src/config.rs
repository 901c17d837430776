//! Configuration for the coldiff CLI.
//!
//! A tiny JSON file (`~/.config/coldiff/config.json` on most platforms)
//! records the diff endpoint and the label written next to each link. Every
//! field is optional; missing values fall back to built-in defaults.
//!
//! Resolution order for the endpoint:
//! - explicit override passed by the caller (CLI flag)
//! - `COLDIFF_DIFF_ENDPOINT`
//! - the config file
//! - [`DEFAULT_DIFF_ENDPOINT`]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use coldiff_types::DEFAULT_LINK_LABEL;
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::expand_tilde;

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "COLDIFF_CONFIG_PATH";

/// Environment variable overriding the diff endpoint.
pub const DIFF_ENDPOINT_ENV: &str = "COLDIFF_DIFF_ENDPOINT";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Diff service the link generator lives on.
pub const DEFAULT_DIFF_ENDPOINT: &str = "https://fs.pyhuo.top/api/v1/diff/";

/// Error surfaced when reading or validating configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure (for example, permissions).
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The endpoint does not parse or does not use http(s).
    #[error("invalid diff endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Values as stored on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColdiffConfig {
    /// Validated diff service URL.
    pub endpoint: String,
    /// Display text of the URL cell written per record.
    pub link_label: String,
    pub user_agent: String,
    /// File the values were read from, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl Default for ColdiffConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DIFF_ENDPOINT.to_string(),
            link_label: DEFAULT_LINK_LABEL.to_string(),
            user_agent: default_user_agent(),
            source: None,
        }
    }
}

impl ColdiffConfig {
    /// Load from the default location (or `COLDIFF_CONFIG_PATH`), then apply
    /// the environment and `endpoint_override`.
    pub fn load(endpoint_override: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path(), endpoint_override)
    }

    /// Same as [`ColdiffConfig::load`] with an explicit file path.
    pub fn load_from(path: &Path, endpoint_override: Option<&str>) -> Result<Self, ConfigError> {
        let file = load_file(path)?;
        let source = path.exists().then(|| path.to_path_buf());
        Self::resolve(file, source, endpoint_override)
    }

    fn resolve(file: ConfigFile, source: Option<PathBuf>, endpoint_override: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let endpoint = endpoint_override
            .map(str::to_string)
            .or_else(|| env::var(DIFF_ENDPOINT_ENV).ok().filter(|value| !value.trim().is_empty()))
            .or(file.endpoint)
            .unwrap_or(defaults.endpoint);
        let endpoint = endpoint.trim().to_string();
        validate_endpoint(&endpoint)?;

        let config = Self {
            endpoint,
            link_label: file.link_label.unwrap_or(defaults.link_label),
            user_agent: file.user_agent.unwrap_or(defaults.user_agent),
            source,
        };
        debug!(endpoint = %config.endpoint, link_label = %config.link_label, "configuration resolved");
        Ok(config)
    }
}

/// Path of the config file, honouring `COLDIFF_CONFIG_PATH`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coldiff")
        .join(CONFIG_FILE_NAME)
}

fn default_user_agent() -> String {
    format!("coldiff/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS)
}

/// Accept only absolute http(s) URLs with a host.
fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let parsed = Url::parse(endpoint).map_err(|error| invalid(error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(file) => Ok(file),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse config file; using defaults"
                );
                Ok(ConfigFile::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(error) => Err(ConfigError::Io(error)),
    }
}
