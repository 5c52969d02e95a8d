use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_LOG_DIRECTORY, DEFAULT_LOG_FILE_PREFIX,
    DEFAULT_LOG_LEVEL, LogLevel,
};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Log directory, relative to the launcher data directory unless absolute
    pub directory: String,
    /// Prefix for the daily rolling log files
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel(DEFAULT_LOG_LEVEL),
            directory: String::from(DEFAULT_LOG_DIRECTORY),
            file_prefix: String::from(DEFAULT_LOG_FILE_PREFIX),
        }
    }
}

impl LoggingConfig {
    /// The prefix names files inside `directory`, so it must be a bare file name.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.file_prefix.trim().is_empty() {
            return Err(ConfigError::logging("logging.file_prefix cannot be empty"));
        }

        if self.file_prefix.contains(['/', '\\']) {
            return Err(ConfigError::logging(format!(
                "logging.file_prefix must not contain a path separator: {}",
                self.file_prefix
            )));
        }

        Ok(())
    }
}
