use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths;

const CONFIG_FILE_PATH: &str = "config.toml";

/// Delay before the simulated response arrives.
pub const DEFAULT_RESPONSE_DELAY_MS: u64 = 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing setting `{0}` for the selected backend")]
    MissingSetting(&'static str),

    #[error("unknown backend `{0}` (expected sqlite, rest or memory)")]
    UnknownBackend(String),
}

/// Where conversations are persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Rest,
    Memory,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "rest" | "supabase" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_key: Option<String>,
    #[serde(default = "default_response_delay_ms")]
    pub response_delay_ms: u64,
}

fn default_response_delay_ms() -> u64 {
    DEFAULT_RESPONSE_DELAY_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            database_path: None,
            supabase_url: None,
            supabase_key: None,
            response_delay_ms: DEFAULT_RESPONSE_DELAY_MS,
        }
    }
}

impl Config {
    /// Load from `~/.branchchat/config.json`, else `./config.toml`, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(
            &paths::config_json_path(),
            Path::new(CONFIG_FILE_PATH),
            |key| std::env::var(key).ok(),
        )
    }

    pub fn from_sources(
        json_path: &Path,
        toml_path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let mut loaded = false;
        if json_path.exists() {
            if let Ok(content) = std::fs::read_to_string(json_path) {
                match serde_json::from_str::<Config>(&content) {
                    Ok(file_config) => {
                        config = file_config;
                        loaded = true;
                    }
                    Err(e) => tracing::warn!("ignoring {}: {}", json_path.display(), e),
                }
            }
        }

        if !loaded && toml_path.exists() {
            if let Ok(content) = std::fs::read_to_string(toml_path) {
                match toml::from_str::<Config>(&content) {
                    Ok(file_config) => config = file_config,
                    Err(e) => tracing::warn!("ignoring {}: {}", toml_path.display(), e),
                }
            }
        }

        if let Some(backend) = env("BRANCHCHAT_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Some(path) = env("BRANCHCHAT_DB_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }
        if let Some(url) = env("SUPABASE_URL") {
            config.supabase_url = Some(url);
        }
        if let Some(key) = env("SUPABASE_ANON_KEY") {
            config.supabase_key = Some(key);
        }
        if let Some(delay) = env("BRANCHCHAT_RESPONSE_DELAY_MS") {
            match delay.trim().parse::<u64>() {
                Ok(ms) => config.response_delay_ms = ms,
                Err(_) => tracing::warn!("ignoring BRANCHCHAT_RESPONSE_DELAY_MS={delay:?}"),
            }
        }

        Ok(config)
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(paths::default_database_path)
    }

    /// URL and anon key of the hosted backend.
    pub fn rest_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let url = self
            .supabase_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingSetting("supabase_url"))?;
        let key = self
            .supabase_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingSetting("supabase_key"))?;
        Ok((url, key))
    }
}
