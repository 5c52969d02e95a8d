use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Unsupported platform '{os}' {location}")]
    UnsupportedPlatform {
        os: String,
        location: ErrorLocation,
    },

    #[error("Failed to spawn backend at {path}: {source} {location}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Backend already running with PID {pid} {location}")]
    AlreadySpawned { pid: u32, location: ErrorLocation },

    #[error("Backend did not respond after {attempts} probe attempts {location}")]
    ProbeTimeout {
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("Invalid probe settings: {message} {location}")]
    ProbeSettings {
        message: String,
        location: ErrorLocation,
    },

    #[error("Backend (PID {pid}) exited unexpectedly with code {code:?} {location}")]
    UnexpectedExit {
        pid: u32,
        code: Option<i32>,
        location: ErrorLocation,
    },

    #[error("Failed to terminate backend (PID {pid}): {message} {location}")]
    Termination {
        pid: u32,
        message: String,
        location: ErrorLocation,
    },

    #[error("Backend (PID {pid}) did not exit within {timeout_ms}ms {location}")]
    TerminationTimeout {
        pid: u32,
        timeout_ms: u128,
        location: ErrorLocation,
    },

    #[error("HTTP error: {source} {location}")]
    Http {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },
}

impl LauncherError {
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform { .. } => {
                "This operating system is not supported. \
                   Use the Windows, Linux or macOS build."
            }
            Self::Spawn { .. } => {
                "The backend could not be started. \
                   The installation may be incomplete; please reinstall PRISPOINT."
            }
            Self::AlreadySpawned { .. } => {
                "The backend is already running. Close the existing window first."
            }
            Self::ProbeTimeout { .. } => {
                "The backend started but is not responding. \
                   Check the logs or restart the application."
            }
            Self::UnexpectedExit { .. } => {
                "The connection to the backend was lost. Restart the application."
            }
            Self::ProbeSettings { .. } => {
                "Configuration file has invalid settings. \
                   Check the logs for details or delete the config file to use defaults."
            }
            _ => "An unexpected error occurred. Please check the logs for details.",
        }
    }
}

impl From<reqwest::Error> for LauncherError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
