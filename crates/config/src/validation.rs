//! Configuration validation
//!
//! Rejects file sink settings that can never work:
//! - Empty path template
//! - Zero open-file capacity
//! - Zero partitions
//! - Raw mode without a raw field

use crate::error::{ConfigError, Result};
use crate::sinks::FileSinkConfig;

const COMPONENT: &str = "sink";
const NAME: &str = "file";

/// Validate a file sink configuration
pub fn validate_file_sink(config: &FileSinkConfig) -> Result<()> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::missing_field(COMPONENT, NAME, "path"));
    }

    if config.max_open_files == Some(0) {
        return Err(ConfigError::invalid_value(
            COMPONENT,
            NAME,
            "max_open_files",
            "must be at least 1",
        ));
    }

    if config.partition_count == 0 {
        return Err(ConfigError::invalid_value(
            COMPONENT,
            NAME,
            "partition_count",
            "must be at least 1",
        ));
    }

    if config.write_raw && config.raw_field.is_empty() {
        return Err(ConfigError::missing_field(COMPONENT, NAME, "raw_field"));
    }

    Ok(())
}
