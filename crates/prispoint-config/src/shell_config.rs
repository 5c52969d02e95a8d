use crate::{ConfigError, ConfigErrorResult, DEFAULT_LOAD_MAX_ATTEMPTS, DEFAULT_LOAD_RETRY_DELAY_MS};

use std::time::Duration;

use serde::Deserialize;

/// Page loading done by the UI shell once the backend is ready.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Delay before reloading after a failed page load
    pub load_retry_delay_ms: u64,
    pub load_max_attempts: u32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            load_retry_delay_ms: DEFAULT_LOAD_RETRY_DELAY_MS,
            load_max_attempts: DEFAULT_LOAD_MAX_ATTEMPTS,
        }
    }
}

impl ShellConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.load_max_attempts == 0 {
            return Err(ConfigError::shell("shell.load_max_attempts must be > 0"));
        }
        Ok(())
    }

    pub fn load_retry_delay(&self) -> Duration {
        Duration::from_millis(self.load_retry_delay_ms)
    }
}
