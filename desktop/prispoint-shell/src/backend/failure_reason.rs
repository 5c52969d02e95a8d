//! Classified failures handed to the UI shell.
//!
//! Raw OS errors stay in the logs; the shell only ever sees one of these.

use crate::backend::LauncherError;

use std::io::ErrorKind;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No backend build exists for this operating system
    UnsupportedPlatform { os: String },
    /// The backend executable could not be launched
    BackendNotStarted { detail: String },
    /// The backend launched but exited before answering
    ExitedDuringStartup { code: Option<i32> },
    /// The backend launched but never answered a probe
    BackendNotResponding { attempts: u32 },
    /// The backend exited after it had become ready
    ConnectionLost { code: Option<i32> },
}

impl FailureReason {
    pub fn classify(error: &LauncherError) -> Self {
        match error {
            LauncherError::UnsupportedPlatform { os, .. } => {
                Self::UnsupportedPlatform { os: os.clone() }
            }
            LauncherError::Spawn { source, .. } => Self::BackendNotStarted {
                detail: spawn_detail(source.kind()).to_string(),
            },
            LauncherError::ProbeTimeout { attempts, .. } => Self::BackendNotResponding {
                attempts: *attempts,
            },
            LauncherError::UnexpectedExit { code, .. } => Self::ConnectionLost { code: *code },
            LauncherError::AlreadySpawned { .. } => Self::BackendNotStarted {
                detail: "a backend is already running".into(),
            },
            LauncherError::ProbeSettings { .. } => Self::BackendNotStarted {
                detail: "launcher settings are invalid".into(),
            },
            _ => Self::BackendNotStarted {
                detail: "unexpected launcher error".into(),
            },
        }
    }

    /// True when the backend never got as far as serving requests.
    pub fn could_not_start(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. } | Self::BackendNotStarted { .. }
        )
    }

    /// Message shown to the user.
    pub fn message(&self) -> String {
        match self {
            Self::UnsupportedPlatform { os } => {
                format!("PRISPOINT cannot run on this platform ({os}).")
            }
            Self::BackendNotStarted { detail } => {
                format!("The backend could not start: {detail}.")
            }
            Self::ExitedDuringStartup { code } => format!(
                "The backend could not start: it exited during startup{}.",
                code_suffix(*code)
            ),
            Self::BackendNotResponding { attempts } => format!(
                "The backend started but is not responding (no answer after {attempts} attempts)."
            ),
            Self::ConnectionLost { code } => format!(
                "The connection to the backend was lost{}.",
                code_suffix(*code)
            ),
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform { .. } => "Use the Windows, Linux or macOS build.",
            Self::BackendNotStarted { .. } | Self::ExitedDuringStartup { .. } => {
                "The installation may be incomplete. Reinstall PRISPOINT or check the logs."
            }
            Self::BackendNotResponding { .. } => {
                "Check the backend log or restart the application."
            }
            Self::ConnectionLost { .. } => "Restart the application.",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

fn spawn_detail(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "executable not found",
        ErrorKind::PermissionDenied => "executable is not runnable",
        _ => "the operating system refused to launch it",
    }
}

fn code_suffix(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {code})"),
        None => String::new(),
    }
}
