use crate::{
    BackendConfig, CONFIG_DIR_ENV, CONFIG_DIR_NAME, CONFIG_FILENAME, ConfigError,
    ConfigErrorResult, LoggingConfig, ProbeConfig, ShellConfig, ShutdownConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub probe: ProbeConfig,
    pub shutdown: ShutdownConfig,
    pub shell: ShellConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the config directory.
    ///
    /// Loading order:
    /// 1. PRISPOINT_CONFIG_DIR env var, else ./.prispoint/
    /// 2. Auto-create the config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply PRISPOINT_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load an explicit config file, then apply env overrides.
    pub fn load_from(path: &Path) -> ConfigErrorResult<Self> {
        let mut config = Self::load_toml(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: PRISPOINT_CONFIG_DIR env var > ./.prispoint/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(CONFIG_DIR_NAME))
    }

    /// Validate all configuration.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.backend.validate()?;
        self.probe.validate()?;
        self.shutdown.validate()?;
        self.shell.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Absolute log directory: `logging.directory` relative to `base` unless absolute.
    pub fn log_dir(&self, base: &Path) -> PathBuf {
        let dir = Path::new(&self.logging.directory);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base.join(dir)
        }
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  backend: {} ({} / {}) at {}",
            self.backend.dist_dir,
            self.backend.windows_executable,
            self.backend.unix_executable,
            self.backend.base_url()
        );
        info!(
            "  probe: path={}, delay={}ms, interval={}ms, timeout={}ms, attempts={}",
            self.probe.path,
            self.probe.initial_delay_ms,
            self.probe.interval_ms,
            self.probe.timeout_ms,
            self.probe.max_attempts
        );
        info!("  shutdown: timeout={}ms", self.shutdown.timeout_ms);
        info!(
            "  shell: load retry={}ms x{}",
            self.shell.load_retry_delay_ms, self.shell.load_max_attempts
        );
        info!(
            "  logging: {} ({})",
            self.logging.level, self.logging.directory
        );
    }

    fn apply_env_overrides(&mut self) {
        // Backend
        Self::apply_env_string("PRISPOINT_BACKEND_DIST_DIR", &mut self.backend.dist_dir);
        Self::apply_env_string(
            "PRISPOINT_BACKEND_WINDOWS_EXECUTABLE",
            &mut self.backend.windows_executable,
        );
        Self::apply_env_string(
            "PRISPOINT_BACKEND_UNIX_EXECUTABLE",
            &mut self.backend.unix_executable,
        );
        Self::apply_env_string("PRISPOINT_BACKEND_HOST", &mut self.backend.host);
        Self::apply_env_parse("PRISPOINT_BACKEND_PORT", &mut self.backend.port);
        Self::apply_env_option_string(
            "PRISPOINT_BACKEND_OUTPUT_LOG",
            &mut self.backend.output_log,
        );

        // Probe
        Self::apply_env_parse(
            "PRISPOINT_PROBE_INITIAL_DELAY_MS",
            &mut self.probe.initial_delay_ms,
        );
        Self::apply_env_parse("PRISPOINT_PROBE_INTERVAL_MS", &mut self.probe.interval_ms);
        Self::apply_env_parse("PRISPOINT_PROBE_TIMEOUT_MS", &mut self.probe.timeout_ms);
        Self::apply_env_parse(
            "PRISPOINT_PROBE_MAX_ATTEMPTS",
            &mut self.probe.max_attempts,
        );
        Self::apply_env_string("PRISPOINT_PROBE_PATH", &mut self.probe.path);

        // Shutdown
        Self::apply_env_parse(
            "PRISPOINT_SHUTDOWN_TIMEOUT_MS",
            &mut self.shutdown.timeout_ms,
        );

        // Shell
        Self::apply_env_parse(
            "PRISPOINT_SHELL_LOAD_RETRY_DELAY_MS",
            &mut self.shell.load_retry_delay_ms,
        );
        Self::apply_env_parse(
            "PRISPOINT_SHELL_LOAD_MAX_ATTEMPTS",
            &mut self.shell.load_max_attempts,
        );

        // Logging
        Self::apply_env_parse("PRISPOINT_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_string("PRISPOINT_LOG_DIR", &mut self.logging.directory);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
