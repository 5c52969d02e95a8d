//! Backend process supervision.

use crate::backend::{
    BackendTarget, LauncherError, LauncherResult, ProcessExit, ProcessHandle, TerminationStrategy,
};

use std::panic::Location;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// A freshly spawned backend and the receiver for its exit event.
pub struct SpawnedBackend {
    pub handle: ProcessHandle,
    /// Yields `Some(exit)` once the process exits
    pub exits: watch::Receiver<Option<ProcessExit>>,
}

/// Owns the single backend child process.
///
/// Responsibilities:
/// - Spawn the backend detached from the launcher's session
/// - Publish exit events, flagging exits nobody asked for
/// - Terminate the backend with the platform's forceful mechanism
pub struct ProcessSupervisor {
    output_log: Option<PathBuf>,
    live: Option<LiveProcess>,
}

struct LiveProcess {
    handle: ProcessHandle,
    termination: TerminationStrategy,
    terminating: Arc<AtomicBool>,
    exit_rx: watch::Receiver<Option<ProcessExit>>,
}

impl LiveProcess {
    fn has_exited(&self) -> bool {
        self.exit_rx.borrow().is_some()
    }
}

impl ProcessSupervisor {
    /// Supervisor that discards backend stdout/stderr.
    pub fn new() -> Self {
        Self {
            output_log: None,
            live: None,
        }
    }

    /// Supervisor that appends backend stdout/stderr to `path`.
    pub fn with_output_log(path: PathBuf) -> Self {
        Self {
            output_log: Some(path),
            live: None,
        }
    }

    /// Spawn the backend executable. Must be called inside a Tokio runtime.
    ///
    /// Fails if a previously spawned backend is still running.
    pub fn spawn(&mut self, target: &BackendTarget) -> LauncherResult<SpawnedBackend> {
        if let Some(live) = &self.live {
            if !live.has_exited() {
                return Err(LauncherError::AlreadySpawned {
                    pid: live.handle.pid(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            debug!("Discarding exited backend handle (PID {})", live.handle.pid());
            self.live = None;
        }

        let path = target.executable_path().to_path_buf();
        info!("Starting backend at: {}", path.display());

        let mut cmd = tokio::process::Command::new(&path);
        cmd.stdin(Stdio::null()).kill_on_drop(true);

        match self.open_output_log() {
            Some((stdout, stderr)) => {
                cmd.stdout(stdout).stderr(stderr);
            }
            None => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        // Detach on Unix
        #[cfg(unix)]
        {
            unsafe {
                cmd.pre_exec(|| {
                    // Own process group, so termination reaches its children
                    if libc::setsid() == -1 {
                        return Err(std::io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
        }

        #[cfg(windows)]
        {
            use windows_sys::Win32::System::Threading::{
                CREATE_NEW_PROCESS_GROUP, CREATE_NO_WINDOW,
            };
            cmd.creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
        }

        let mut child = cmd.spawn().map_err(|source| LauncherError::Spawn {
            path: path.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let Some(pid) = child.id() else {
            return Err(LauncherError::Spawn {
                path,
                source: std::io::Error::other("process exited before reporting a PID"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        info!("Spawned backend with PID: {pid}");

        let (exit_tx, exit_rx) = watch::channel(None);
        let terminating = Arc::new(AtomicBool::new(false));
        let expected = terminating.clone();

        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    error!("Failed to wait on backend (PID {pid}): {e}");
                    None
                }
            };

            let expected = expected.load(Ordering::SeqCst);
            if expected {
                info!("Backend (PID {pid}) exited after termination");
            } else {
                warn!("Backend (PID {pid}) exited unexpectedly with code {code:?}");
            }

            exit_tx.send_replace(Some(ProcessExit {
                pid,
                code,
                expected,
            }));
        });

        let handle = ProcessHandle::new(pid);
        self.live = Some(LiveProcess {
            handle: handle.clone(),
            termination: target.termination(),
            terminating,
            exit_rx: exit_rx.clone(),
        });

        Ok(SpawnedBackend {
            handle,
            exits: exit_rx,
        })
    }

    /// Current handle, with `running` refreshed from the exit watcher.
    pub fn handle(&mut self) -> Option<ProcessHandle> {
        let live = self.live.as_mut()?;
        if live.has_exited() {
            live.handle.mark_stopped();
        }
        Some(live.handle.clone())
    }

    /// Forcefully terminate the backend and wait up to `timeout` for it to exit.
    ///
    /// Idempotent: a stale handle, an already exited backend, or a second call
    /// for the same handle is a no-op. The handle is discarded afterwards.
    pub async fn terminate(
        &mut self,
        handle: &ProcessHandle,
        timeout: Duration,
    ) -> LauncherResult<()> {
        let Some(live) = self.live.as_mut() else {
            debug!("No live backend to terminate");
            return Ok(());
        };

        let pid = handle.pid();
        if live.handle.pid() != pid {
            debug!("Ignoring terminate for stale PID {pid}");
            return Ok(());
        }

        if live.has_exited() {
            debug!("Backend (PID {pid}) already exited");
            live.handle.mark_stopped();
            self.live = None;
            return Ok(());
        }

        live.terminating.store(true, Ordering::SeqCst);
        let kill_result = live.termination.kill(pid).await;

        let mut exit_rx = live.exit_rx.clone();
        let acknowledged = tokio::time::timeout(timeout, exit_rx.wait_for(Option::is_some))
            .await
            .is_ok();

        live.handle.mark_stopped();
        self.live = None;

        kill_result?;

        if !acknowledged {
            return Err(LauncherError::TerminationTimeout {
                pid,
                timeout_ms: timeout.as_millis(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!("Backend (PID {pid}) terminated");
        Ok(())
    }

    /// Synchronous kill of a still-running backend, without waiting for exit.
    pub fn terminate_blocking(&mut self) {
        let Some(mut live) = self.live.take() else {
            return;
        };

        if live.has_exited() {
            return;
        }

        let pid = live.handle.pid();
        live.terminating.store(true, Ordering::SeqCst);
        if let Err(e) = live.termination.kill_blocking(pid) {
            error!("Failed to kill backend (PID {pid}): {e}");
        }
        live.handle.mark_stopped();
    }

    fn open_output_log(&self) -> Option<(Stdio, Stdio)> {
        let path = self.output_log.as_ref()?;

        if let Some(dir) = path.parent()
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            warn!("Cannot create backend log directory {}: {e}", dir.display());
            return None;
        }

        let file = match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot open backend log {}: {e}", path.display());
                return None;
            }
        };

        match file.try_clone() {
            Ok(clone) => Some((Stdio::from(file), Stdio::from(clone))),
            Err(e) => {
                warn!("Cannot share backend log handle: {e}");
                None
            }
        }
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.terminate_blocking();
    }
}
