use crate::error::{Result, SnipError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.json";
pub const DB_FILENAME: &str = "snippets.json";
pub const SERVER_DB_FILENAME: &str = "server-snippets.json";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_PORT: u16 = 3000;

pub const HOME_ENV: &str = "SNIPSYNC_HOME";
pub const API_URL_ENV: &str = "SNIPSYNC_API_URL";
pub const API_KEY_ENV: &str = "SNIPSYNC_API_KEY";
pub const USE_API_ENV: &str = "SNIPSYNC_USE_API";

/// Get the snipsync configuration directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".snipsync"))
        .unwrap_or_else(|_| PathBuf::from(".snipsync"))
}

/// Settings consumed by the save policy and the remote client.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "useAPI")]
    pub use_api: bool,
    /// Directory holding the local snippet file. Not read from disk.
    #[serde(skip)]
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            use_api: false,
            data_dir: get_config_dir(),
        }
    }
}

impl Config {
    /// Load the config file from the config directory and apply environment overrides
    pub fn load() -> Result<Self> {
        let config_dir = get_config_dir();
        let mut config = Self::from_file(&config_dir.join(CONFIG_FILENAME))?;
        config.data_dir = config_dir;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file; a missing or blank file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| SnipError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(key) = lookup(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(flag) = lookup(USE_API_ENV) {
            self.use_api = parse_flag(&flag).ok_or_else(|| {
                SnipError::Config(format!("{} must be a boolean, got '{}'", USE_API_ENV, flag))
            })?;
        }
        Ok(())
    }

    pub fn validate(&mut self) -> Result<()> {
        self.api_url = self.api_url.trim().trim_end_matches('/').to_string();
        if self.api_url.is_empty() {
            return Err(SnipError::Config("apiUrl must not be empty".to_string()));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(SnipError::Config(format!(
                "apiUrl must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }

        // A blank key means no credential
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.api_key = None;
        }
        Ok(())
    }

    /// Path to the local snippet file
    pub fn db_file_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }

    /// Path to the reference server's snippet file
    pub fn server_db_file_path(&self) -> PathBuf {
        self.data_dir.join(SERVER_DB_FILENAME)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
