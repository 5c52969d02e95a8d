use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_DIST_DIR, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_UNIX_EXECUTABLE, DEFAULT_WINDOWS_EXECUTABLE, MIN_PORT,
};

use serde::Deserialize;

/// Where the bundled backend lives and where it listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Directory holding the packaged backend. Relative paths resolve
    /// against the directory of the running launcher executable.
    pub dist_dir: String,
    /// Executable file name used on Windows
    pub windows_executable: String,
    /// Executable file name used on Linux and macOS
    pub unix_executable: String,
    pub host: String,
    pub port: u16,
    /// Optional file (relative to the log directory) receiving backend stdout/stderr
    pub output_log: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            dist_dir: String::from(DEFAULT_DIST_DIR),
            windows_executable: String::from(DEFAULT_WINDOWS_EXECUTABLE),
            unix_executable: String::from(DEFAULT_UNIX_EXECUTABLE),
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            output_log: None,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.port < MIN_PORT {
            return Err(ConfigError::backend(format!(
                "backend.port must be >= {}, got {}",
                MIN_PORT, self.port
            )));
        }

        if self.host != DEFAULT_HOST && self.host != "localhost" {
            return Err(ConfigError::backend(format!(
                "backend.host must be {DEFAULT_HOST} or localhost, got {}",
                self.host
            )));
        }

        Self::validate_executable("backend.windows_executable", &self.windows_executable)?;
        Self::validate_executable("backend.unix_executable", &self.unix_executable)?;

        if self.dist_dir.trim().is_empty() {
            return Err(ConfigError::backend("backend.dist_dir must not be empty"));
        }

        Ok(())
    }

    /// Base URL of the backend, e.g. `http://127.0.0.1:5001`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    fn validate_executable(field: &str, name: &str) -> ConfigErrorResult<()> {
        if name.trim().is_empty() {
            return Err(ConfigError::backend(format!("{field} must not be empty")));
        }

        if name.contains('/') || name.contains('\\') {
            return Err(ConfigError::backend(format!(
                "{field} must be a plain file name, got {name}"
            )));
        }

        Ok(())
    }
}
