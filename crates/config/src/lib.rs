//! logspool Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the sink path is required.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use logspool_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sink]\npath = \"logs/%Y%m%d.log\"").unwrap();
//! assert_eq!(config.sink.effective_max_open_files(), 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [sink]
//! path = "logs/%Y%m%d-%H.log"
//! timestamp_key = "timestamp"
//! partition_count = 2
//! ```

mod error;
mod logging;
mod sinks;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use sinks::FileSinkConfig;
pub use validation::validate_file_sink;

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Internal logging
    pub log: LogConfig,

    /// File sink settings
    pub sink: FileSinkConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file without validating it
    ///
    /// For callers that layer overrides on top before calling `validate`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        validate_file_sink(&self.sink)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
