//! Maps the running operating system to the backend executable and the
//! termination mechanism used to tear it down.

use crate::backend::{BackendTarget, LauncherError, LauncherResult, TerminationStrategy};

use std::fmt;
use std::panic::Location;
use std::path::Path;

use error_location::ErrorLocation;
use prispoint_config::BackendConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
}

impl Platform {
    /// Parse an OS identifier as reported by `std::env::consts::OS`.
    #[track_caller]
    pub fn from_os(os: &str) -> LauncherResult<Self> {
        match os {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            other => Err(LauncherError::UnsupportedPlatform {
                os: other.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    #[track_caller]
    pub fn current() -> LauncherResult<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Windows backends may spawn helper processes of their own, so the whole
    /// tree is killed there. Elsewhere the backend gets a direct signal.
    pub fn termination(self) -> TerminationStrategy {
        match self {
            Self::Windows => TerminationStrategy::TreeKill,
            Self::Linux | Self::MacOs => TerminationStrategy::Signal,
        }
    }

    pub fn executable_name(self, backend: &BackendConfig) -> &str {
        match self {
            Self::Windows => &backend.windows_executable,
            Self::Linux | Self::MacOs => &backend.unix_executable,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
        };
        f.write_str(name)
    }
}

/// Resolve the backend target for an OS identifier.
///
/// Pure: nothing on disk is inspected, a missing binary surfaces later as a
/// spawn failure. A relative `dist_dir` is joined onto `base_dir`.
#[track_caller]
pub fn resolve(
    os: &str,
    backend: &BackendConfig,
    base_dir: &Path,
) -> LauncherResult<BackendTarget> {
    let platform = Platform::from_os(os)?;

    let dist_dir = Path::new(&backend.dist_dir);
    let dist_dir = if dist_dir.is_absolute() {
        dist_dir.to_path_buf()
    } else {
        base_dir.join(dist_dir)
    };

    Ok(BackendTarget::new(
        dist_dir.join(platform.executable_name(backend)),
        backend.host.clone(),
        backend.port,
        platform.termination(),
    ))
}
