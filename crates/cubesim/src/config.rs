//! # Host Configuration
//!
//! Loaded once at startup from a TOML file. A missing file means defaults.
//!
//! ```toml
//! capacity = 4
//! tick_rate = 60
//! frames = 600
//! drag_interval_ms = 50
//! seed = 7
//! table_columns = 2
//! log_filter = "info,cubesim_core=debug"
//!
//! [graph]
//! collapse_transient_links = true
//! ```

use std::path::Path;

use cubesim_core::GraphConfig;
use cubesim_shared::{DEFAULT_CAPACITY, MAX_CUBES, TICK_RATE};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`SimConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings of one simulator run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cubes the stand-in engine declares.
    pub capacity: usize,
    /// Engine ticks per second.
    pub tick_rate: u32,
    /// Ticks to run before stopping. 0 runs until stopped.
    pub frames: u64,
    /// Pause between scripted drags.
    pub drag_interval_ms: u64,
    /// Seed of the drag script.
    pub seed: u64,
    /// Width of the initial flow layout.
    pub table_columns: usize,
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Graph behaviour.
    pub graph: GraphConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            tick_rate: TICK_RATE,
            frames: 600,
            drag_interval_ms: 250,
            seed: 0x5EED,
            table_columns: 4,
            log_filter: "info".to_owned(),
            graph: GraphConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 || self.capacity > MAX_CUBES {
            return Err(ConfigError::Invalid(format!(
                "capacity must be 1..={MAX_CUBES}, got {}",
                self.capacity
            )));
        }
        if self.tick_rate == 0 || self.tick_rate > 1_000 {
            return Err(ConfigError::Invalid(format!(
                "tick_rate must be 1..=1000, got {}",
                self.tick_rate
            )));
        }
        if self.table_columns == 0 {
            return Err(ConfigError::Invalid("table_columns must be at least 1".to_owned()));
        }
        Ok(())
    }
}
