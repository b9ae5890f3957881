use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::search::ImageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url}: expected http:// or https://")]
    InvalidBaseUrl { url: String },
    #[error("failed to build http client: {message}")]
    HttpClient { message: String },
}

const APP_DIR: &str = "postcomposer";
const APP_CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_PUBLISH_PATH: &str = "/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_KEYWORD_DEBOUNCE_MS: u64 = 500;
const DEFAULT_FILTER_DEBOUNCE_MS: u64 = 500;
const DEFAULT_PREVIEW_DEBOUNCE_MS: u64 = 300;

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub publish_path: String,
    pub request_timeout_secs: u64,
    pub keyword_debounce_ms: u64,
    pub filter_debounce_ms: u64,
    pub preview_debounce_ms: u64,
    pub default_source: ImageSource,
    /// Initial value only; the toggle control is authoritative once queried.
    pub translation_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            publish_path: DEFAULT_PUBLISH_PATH.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            keyword_debounce_ms: DEFAULT_KEYWORD_DEBOUNCE_MS,
            filter_debounce_ms: DEFAULT_FILTER_DEBOUNCE_MS,
            preview_debounce_ms: DEFAULT_PREVIEW_DEBOUNCE_MS,
            default_source: ImageSource::default(),
            translation_enabled: true,
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn timings(&self) -> DebounceTimings {
        DebounceTimings {
            keywords: Duration::from_millis(self.keyword_debounce_ms),
            filters: Duration::from_millis(self.filter_debounce_ms),
            preview: Duration::from_millis(self.preview_debounce_ms),
        }
    }
}

/// Quiet periods for each independently debounced input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTimings {
    pub keywords: Duration,
    pub filters: Duration,
    pub preview: Duration,
}

impl Default for DebounceTimings {
    fn default() -> Self {
        AppConfig::default().timings()
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
