use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_PROBE_INITIAL_DELAY_MS, DEFAULT_PROBE_INTERVAL_MS,
    DEFAULT_PROBE_MAX_ATTEMPTS, DEFAULT_PROBE_PATH, DEFAULT_PROBE_TIMEOUT_MS,
    MAX_PROBE_MAX_ATTEMPTS, MIN_PROBE_INTERVAL_MS, MIN_PROBE_MAX_ATTEMPTS,
};

use std::time::Duration;

use serde::Deserialize;

/// Readiness polling against the backend.
///
/// Each attempt gets its own interval slot, so an exhausted probe
/// takes at least `initial_delay_ms + max_attempts * interval_ms`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Delay before the first attempt in milliseconds
    pub initial_delay_ms: u64,
    /// Wait between attempts in milliseconds
    pub interval_ms: u64,
    /// Per-attempt request timeout in milliseconds (must be < interval_ms)
    pub timeout_ms: u64,
    pub max_attempts: u32,
    /// Path requested on each attempt
    pub path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_PROBE_INITIAL_DELAY_MS,
            interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            max_attempts: DEFAULT_PROBE_MAX_ATTEMPTS,
            path: String::from(DEFAULT_PROBE_PATH),
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.max_attempts < MIN_PROBE_MAX_ATTEMPTS || self.max_attempts > MAX_PROBE_MAX_ATTEMPTS
        {
            return Err(ConfigError::probe(format!(
                "probe.max_attempts must be {}-{}, got {}",
                MIN_PROBE_MAX_ATTEMPTS, MAX_PROBE_MAX_ATTEMPTS, self.max_attempts
            )));
        }

        if self.interval_ms < MIN_PROBE_INTERVAL_MS {
            return Err(ConfigError::probe(format!(
                "probe.interval_ms must be >= {}, got {}",
                MIN_PROBE_INTERVAL_MS, self.interval_ms
            )));
        }

        if self.timeout_ms == 0 || self.timeout_ms >= self.interval_ms {
            return Err(ConfigError::probe(format!(
                "probe.timeout_ms must be > 0 and < probe.interval_ms ({}), got {}",
                self.interval_ms, self.timeout_ms
            )));
        }

        if !self.path.starts_with('/') {
            return Err(ConfigError::probe(format!(
                "probe.path must start with '/', got {}",
                self.path
            )));
        }

        Ok(())
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
