//! Configuration for the Fieldgate gateway

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace index for all device-derived node identifiers
    pub namespace: u16,

    /// Historization settings
    pub history: HistoryConfig,

    /// Default tracing filter (overridden by `RUST_LOG`)
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: 2,
            history: HistoryConfig::default(),
            log_filter: "info".into(),
        }
    }
}

/// Historization settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Arm historization for device metrics
    pub enabled: bool,

    /// Backing database file; `None` keeps history in memory
    pub database_path: Option<PathBuf>,

    /// Monitored-item sampling interval in milliseconds
    pub sampling_interval_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: None,
            sampling_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML or JSON file, chosen by extension
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unsupported
    /// extension or fails to parse
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&raw)?),
            Some("json") => Ok(serde_json::from_str(&raw)?),
            other => Err(Error::Config(format!(
                "unsupported config extension {other:?} (expected toml or json)"
            ))),
        }
    }
}
