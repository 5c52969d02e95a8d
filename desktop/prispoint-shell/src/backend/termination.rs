//! Forceful backend termination, dispatched per platform.

use crate::backend::{LauncherError, LauncherResult};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStrategy {
    /// `taskkill /pid <pid> /f /t`: the process and every descendant
    TreeKill,
    /// SIGKILL to the backend's process group; the backend leads its own group
    Signal,
}

impl TerminationStrategy {
    /// Kill `pid`. A process that is already gone counts as success.
    pub async fn kill(self, pid: u32) -> LauncherResult<()> {
        match self {
            Self::TreeKill => tree_kill(pid).await,
            Self::Signal => signal_kill(pid),
        }
    }

    /// Blocking variant for contexts without a runtime (drop, signal threads).
    pub fn kill_blocking(self, pid: u32) -> LauncherResult<()> {
        match self {
            Self::TreeKill => {
                let output = std::process::Command::new("taskkill")
                    .args(["/pid", &pid.to_string(), "/f", "/t"])
                    .output()
                    .map_err(|e| termination_error(pid, format!("taskkill could not run: {e}")))?;
                taskkill_result(pid, &output)
            }
            Self::Signal => signal_kill(pid),
        }
    }
}

#[track_caller]
fn termination_error(pid: u32, message: String) -> LauncherError {
    LauncherError::Termination {
        pid,
        message,
        location: ErrorLocation::from(Location::caller()),
    }
}

async fn tree_kill(pid: u32) -> LauncherResult<()> {
    info!("Killing backend process tree (PID: {pid})");

    let output = tokio::process::Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/f", "/t"])
        .output()
        .await
        .map_err(|e| termination_error(pid, format!("taskkill could not run: {e}")))?;

    taskkill_result(pid, &output)
}

pub(crate) fn taskkill_result(pid: u32, output: &std::process::Output) -> LauncherResult<()> {
    if output.status.success() {
        return Ok(());
    }

    // taskkill exits 128 when the PID no longer exists
    if output.status.code() == Some(128) {
        debug!("PID {pid} already gone");
        return Ok(());
    }

    Err(termination_error(
        pid,
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
    ))
}

#[cfg(unix)]
fn signal_kill(pid: u32) -> LauncherResult<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill, killpg};
    use nix::unistd::Pid;

    info!("Sending SIGKILL to process group {pid}");

    let pid_t = Pid::from_raw(pid as i32);
    match killpg(pid_t, Signal::SIGKILL) {
        Ok(()) => return Ok(()),
        // No such group; the PID may still exist outside it
        Err(Errno::ESRCH) => {}
        Err(e) => return Err(termination_error(pid, e.to_string())),
    }

    match kill(pid_t, Signal::SIGKILL) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => {
            debug!("PID {pid} already gone");
            Ok(())
        }
        Err(e) => Err(termination_error(pid, e.to_string())),
    }
}

#[cfg(not(unix))]
fn signal_kill(pid: u32) -> LauncherResult<()> {
    Err(termination_error(
        pid,
        "signal termination is only available on Unix".into(),
    ))
}
