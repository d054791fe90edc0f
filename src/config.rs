//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `station.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - PollingConfig: Endpoint url, interval and response ordering.
//!     - HistoryConfig: How many points each series keeps.
//!     - StorageConfig: Where the state snapshot lives.
//!     - ServerConfig: The read-only dashboard api.
//!     - SimulationConfig: Use generated readings instead of the endpoint.
//!     - LoggingConfig: Default log level and per-reading output.
//!
//! ==============================================================================

use crate::domain::DEFAULT_CAPACITY;
use crate::store::ResponseOrdering;

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SENSOR_URL: &str = "https://weather-station-api-syyt.onrender.com/weather";

/// where the effective configuration came from
#[derive(Debug)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults { failures: Vec<(PathBuf, String)> },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => tracing::info!("[CONFIG] Loaded from {}", path.display()),
            ConfigOrigin::Defaults { failures } => {
                for (path, error) in failures {
                    tracing::warn!("[CONFIG] Failed to load {}: {}", path.display(), error);
                }
                tracing::warn!("[CONFIG] No usable config file found - using defaults");
            }
        }
    }
}

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StationConfig {
    pub polling: PollingConfig,
    pub history: HistoryConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub url: String,
    pub interval_seconds: u64,
    pub ordering: ResponseOrdering,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub key: String,
    /// keep state in memory only
    pub ephemeral: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SENSOR_URL.to_string(),
            interval_seconds: 10,
            ordering: ResponseOrdering::LastArrival,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            key: "sensorData".to_string(),
            ephemeral: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_sensor_data: true,
        }
    }
}

impl PollingConfig {
    /// polling period, never below one second
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

impl StationConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: StationConfig = toml::from_str(content).context("Failed to parse config")?;
        anyhow::ensure!(config.history.capacity > 0, "history.capacity must be at least 1");
        Ok(config)
    }

    /// Load with default fallback.
    ///
    /// logging is not up yet when this runs, so the outcome is returned as a
    /// `ConfigOrigin` and reported once the subscriber is installed.
    pub fn load_or_default() -> (Self, ConfigOrigin) {
        let paths = [
            PathBuf::from("config").join("station.toml"),
            PathBuf::from("..").join("config").join("station.toml"),
        ];

        let mut failures = Vec::new();
        for path in paths {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return (config, ConfigOrigin::File(path)),
                    Err(e) => failures.push((path, format!("{:#}", e))),
                }
            }
        }

        (Self::default(), ConfigOrigin::Defaults { failures })
    }

    /// Log configuration summary
    pub fn print_summary(&self) {
        let source = if self.simulation.enabled { "simulator" } else { self.polling.url.as_str() };
        let storage = if self.storage.ephemeral {
            "memory".to_string()
        } else {
            self.storage.data_dir.join(format!("{}.json", self.storage.key)).display().to_string()
        };

        tracing::info!("[CONFIG] Source: {}", source);
        tracing::info!("[CONFIG] Poll Interval: {}s ({:?})", self.polling.interval().as_secs(), self.polling.ordering);
        tracing::info!("[CONFIG] History: {} points per series", self.history.capacity);
        tracing::info!("[CONFIG] Storage: {}", storage);
        if self.server.enabled {
            tracing::info!("[CONFIG] Dashboard: {}", self.server.bind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = StationConfig::parse("").unwrap();
        assert_eq!(config.polling.url, DEFAULT_SENSOR_URL);
        assert_eq!(config.polling.interval(), Duration::from_secs(10));
        assert_eq!(config.polling.ordering, ResponseOrdering::LastArrival);
        assert_eq!(config.history.capacity, 24);
        assert_eq!(config.storage.key, "sensorData");
        assert!(config.server.enabled);
        assert!(!config.simulation.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = StationConfig::parse(
            r#"
            [polling]
            url = "http://station.local/weather"
            interval_seconds = 5
            ordering = "latest_request"

            [history]
            capacity = 48

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.polling.url, "http://station.local/weather");
        assert_eq!(config.polling.interval(), Duration::from_secs(5));
        assert_eq!(config.polling.ordering, ResponseOrdering::LatestRequest);
        assert_eq!(config.history.capacity, 48);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.show_sensor_data);
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(StationConfig::parse("[history]\ncapacity = 0").is_err());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = StationConfig::parse("[polling]\ninterval_seconds = 0").unwrap();
        assert_eq!(config.polling.interval(), Duration::from_secs(1));
    }

    #[test]
    fn unknown_ordering_is_rejected() {
        assert!(StationConfig::parse("[polling]\nordering = \"random\"").is_err());
    }
}
