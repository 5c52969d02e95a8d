mod backend_config;
mod config;
mod error;
mod log_level;
mod logging_config;
mod probe_config;
mod shell_config;
mod shutdown_config;

#[cfg(test)]
mod tests;

pub use backend_config::BackendConfig;
pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use probe_config::ProbeConfig;
pub use shell_config::ShellConfig;
pub use shutdown_config::ShutdownConfig;

pub const CONFIG_DIR_ENV: &str = "PRISPOINT_CONFIG_DIR";
pub const CONFIG_DIR_NAME: &str = ".prispoint";
pub const CONFIG_FILENAME: &str = "config.toml";

// Backend
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_WINDOWS_EXECUTABLE: &str = "app.exe";
pub const DEFAULT_UNIX_EXECUTABLE: &str = "app";
pub const MIN_PORT: u16 = 1024;

// Probe
pub const DEFAULT_PROBE_INITIAL_DELAY_MS: u64 = 500;
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 800;
pub const DEFAULT_PROBE_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_PROBE_PATH: &str = "/";
pub const MIN_PROBE_INTERVAL_MS: u64 = 50;
pub const MIN_PROBE_MAX_ATTEMPTS: u32 = 1;
pub const MAX_PROBE_MAX_ATTEMPTS: u32 = 100;

// Shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5000;

// Shell
pub const DEFAULT_LOAD_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_LOAD_MAX_ATTEMPTS: u32 = 5;

// Logging
pub const DEFAULT_LOG_LEVEL_STRING: &str = "info";
pub const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
pub const DEFAULT_LOG_DIRECTORY: &str = "logs";
pub const DEFAULT_LOG_FILE_PREFIX: &str = "prispoint";
