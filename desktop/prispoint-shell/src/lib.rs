//! PRISPOINT desktop launcher: starts the bundled backend, waits until it
//! answers over HTTP, hands it to the UI shell and tears it down on exit.

pub mod backend;
pub mod cli;
pub mod logging;
pub mod shell;

#[cfg(test)]
mod tests;

pub use backend::{
    BackendTarget, FailureReason, LauncherError, LauncherResult, LifecycleCoordinator,
    LifecycleState, LifecycleStatus, Platform, ProbeAttempt, ProbeOutcome, ProbeVerdict,
    ProcessExit, ProcessHandle, ProcessSupervisor, ReadinessProbe, SpawnedBackend,
    TerminationStrategy, build_status, resolve,
};
pub use shell::{ConsoleShell, PageLoad, PageLoader, UiShell, attach_shell};

/// Exit status when `--exit-on-failure` tears down a failed launch.
pub const EXIT_BACKEND_FAILED: u8 = 2;

/// Directory name under the platform data directory.
pub const DATA_DIR_NAME: &str = "prispoint";
