//! Server configuration from the environment.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use autoparc_core::Coordinates;
use autoparc_fleet::DEFAULT_DEPOT;
use autoparc_geo::google::DEFAULT_BASE_URL;
use tracing::info;

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
#[error("invalid {key} value {value:?}: {reason}")]
pub struct ConfigError {
    key: String,
    value: String,
    reason: String,
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// SQLite database through sqlx
    Sqlite,
    /// One JSON file per record
    Json,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json" => Ok(Self::Json),
            other => Err(format!("expected sqlite or json, got {other}")),
        }
    }
}

/// Runtime settings of the API server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listening port
    pub port: u16,
    /// Storage backend
    pub storage: StorageKind,
    /// SQLite connection URL
    pub database_url: String,
    /// Root directory of the JSON backend
    pub data_dir: PathBuf,
    /// Google Maps API key; without it distances fall back to haversine
    pub google_maps_api_key: Option<String>,
    /// Google Maps API root
    pub maps_base_url: String,
    /// Trip origin when a mission only has a destination
    pub depot: Coordinates,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            storage: StorageKind::Sqlite,
            database_url: "sqlite://autoparc.db?mode=rwc".to_string(),
            data_dir: PathBuf::from(".autoparc"),
            google_maps_api_key: None,
            maps_base_url: DEFAULT_BASE_URL.to_string(),
            depot: DEFAULT_DEPOT,
        }
    }
}

impl Config {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            port: load(&lookup, "AUTOPARC_PORT", defaults.port)?,
            storage: load(&lookup, "AUTOPARC_STORAGE", defaults.storage)?,
            database_url: load(&lookup, "AUTOPARC_DATABASE_URL", defaults.database_url)?,
            data_dir: load(&lookup, "AUTOPARC_DATA_DIR", defaults.data_dir)?,
            google_maps_api_key: lookup("GOOGLE_MAPS_API_KEY").filter(|k| !k.trim().is_empty()),
            maps_base_url: load(&lookup, "AUTOPARC_MAPS_BASE_URL", defaults.maps_base_url)?,
            depot: Coordinates::new(
                load(&lookup, "AUTOPARC_DEPOT_LAT", defaults.depot.lat)?,
                load(&lookup, "AUTOPARC_DEPOT_LNG", defaults.depot.lng)?,
            ),
        };

        if !config.depot.is_valid() {
            return Err(ConfigError {
                key: "AUTOPARC_DEPOT_LAT/AUTOPARC_DEPOT_LNG".to_string(),
                value: config.depot.to_string(),
                reason: "out of range".to_string(),
            });
        }
        Ok(config)
    }
}

fn load<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError {
            key: key.to_string(),
            value,
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}
