use crate::constants::DEFAULT_OSM_API_BASE_URL;
use crate::error::{PosError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "CAMPUS_COFFEE_CONFIG";
pub const DATABASE_PATH_ENV: &str = "CAMPUS_COFFEE_DB";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub osm: OsmConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OsmConfig {
    pub api_base_url: String,
}

impl Default for OsmConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_OSM_API_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; in-memory storage when unset
    pub database_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub allow_clear: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
        }
    }
}

impl Config {
    /// Load from `$CAMPUS_COFFEE_CONFIG` or `config.toml`, then apply
    /// environment overrides. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let config_path =
            env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_from(&config_path)?;
        if let Ok(db_path) = env::var(DATABASE_PATH_ENV) {
            config.storage.database_path = Some(db_path);
        }
        Ok(config)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            PosError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
