use crate::{ConfigError, ConfigErrorResult, DEFAULT_SHUTDOWN_TIMEOUT_MS};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long to wait for the backend to acknowledge termination
    pub timeout_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl ShutdownConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::shutdown("shutdown.timeout_ms must be > 0"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
