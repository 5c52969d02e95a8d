//! Backend launch, readiness and shutdown as one state machine.

use crate::backend::{
    FailureReason, LauncherError, LauncherResult, LifecycleState, ProbeOutcome, ProbeVerdict,
    ProcessExit, ProcessSupervisor, ReadinessProbe, SpawnedBackend, platform,
};

use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use error_location::ErrorLocation;
use prispoint_config::Config;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Drives the backend from launch to shutdown.
///
/// Responsibilities:
/// - Resolve and spawn the backend through the supervisor
/// - Probe readiness, racing the probe against backend exit and shutdown
/// - Classify failures for the UI shell
/// - Terminate the backend on stop, exactly once
pub struct LifecycleCoordinator {
    config: Config,
    os: String,
    base_dir: PathBuf,
    supervisor: Arc<Mutex<ProcessSupervisor>>,
    backend_pid: Arc<AtomicU32>,
    state: StateCell,
    shutdown_tx: watch::Sender<bool>,
}

impl LifecycleCoordinator {
    /// Coordinator for the running OS. A relative `dist_dir` resolves
    /// against `base_dir`.
    pub fn new(config: Config, base_dir: PathBuf) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::NotStarted);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            os: std::env::consts::OS.to_string(),
            base_dir,
            supervisor: Arc::new(Mutex::new(ProcessSupervisor::new())),
            backend_pid: Arc::new(AtomicU32::new(0)),
            state: StateCell {
                state_tx,
                events_tx,
            },
            shutdown_tx,
        }
    }

    /// Override the OS identifier handed to the resolver.
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    pub fn with_supervisor(mut self, supervisor: ProcessSupervisor) -> Self {
        self.supervisor = Arc::new(Mutex::new(supervisor));
        self
    }

    /// Launch the backend and wait until it is ready or has failed. Returns
    /// the state reached; `Stopped` when a shutdown interrupted the launch.
    ///
    /// Only the first call does anything; later calls return the current state.
    pub async fn start(&self) -> LifecycleState {
        if !self.state.transition(LifecycleState::Starting) {
            warn!("Ignoring start() in state {}", self.state());
            return self.state();
        }

        let started = Instant::now();

        let target = match platform::resolve(&self.os, &self.config.backend, &self.base_dir) {
            Ok(target) => target,
            Err(e) => return self.fail(&e).await,
        };
        debug!(
            "Resolved backend {} ({:?}) at {}",
            target.executable_path().display(),
            target.termination(),
            target.base_url()
        );

        let mut probe = match ReadinessProbe::new(
            &target,
            &self.config.probe,
            self.shutdown_tx.subscribe(),
        ) {
            Ok(probe) => probe,
            Err(e) => return self.fail(&e).await,
        };

        let SpawnedBackend { handle, mut exits } = {
            let mut supervisor = self.supervisor.lock().await;

            // stop() raises the flag before taking the lock
            if self.shutdown_requested() {
                info!("Shutdown requested before the backend was spawned");
                return self.interrupted().await;
            }

            match supervisor.spawn(&target) {
                Ok(spawned) => spawned,
                Err(e) => return self.fail(&e).await,
            }
        };
        self.backend_pid.store(handle.pid(), Ordering::SeqCst);

        if !self.state.transition(LifecycleState::Probing { attempt: 1 }) {
            return self.interrupted().await;
        }

        let verdict = tokio::select! {
            biased;
            exit = wait_for_exit(&mut exits) => Err(exit),
            verdict = self.drive_probe(&mut probe) => Ok(verdict),
        };

        match verdict {
            Err(exit) => {
                self.backend_pid.store(0, Ordering::SeqCst);
                if exit.expected || self.shutdown_requested() {
                    return self.interrupted().await;
                }
                error!(
                    "Backend (PID {}) exited during startup with code {:?}",
                    exit.pid, exit.code
                );
                self.fail_with(FailureReason::ExitedDuringStartup { code: exit.code })
                    .await
            }
            Ok(ProbeVerdict::Ready { attempts }) => {
                let url = target.base_url();
                if !self
                    .state
                    .transition(LifecycleState::Ready { url: url.clone() })
                {
                    return self.interrupted().await;
                }

                info!(
                    "Backend ready at {url} after {attempts} attempt(s) in {}",
                    humantime::format_duration(whole_millis(started.elapsed()))
                );
                self.watch_backend(exits);
                self.state()
            }
            Ok(ProbeVerdict::Exhausted { attempts }) => {
                let error = LauncherError::ProbeTimeout {
                    attempts,
                    location: ErrorLocation::from(Location::caller()),
                };
                self.fail(&error).await
            }
            Ok(ProbeVerdict::Cancelled { attempts }) => {
                info!("Readiness probe cancelled after {attempts} attempt(s)");
                self.interrupted().await
            }
            Ok(ProbeVerdict::InProgress { .. }) => self.state(),
        }
    }

    /// Terminate the backend and move to `Stopped`.
    ///
    /// Idempotent. Concurrent callers all return once `Stopped` is reached;
    /// only the first one reports a termination error.
    pub async fn stop(&self) -> LauncherResult<()> {
        self.shutdown_tx.send_replace(true);

        if !self.state.transition(LifecycleState::ShuttingDown) {
            let mut state_rx = self.state.state_tx.subscribe();
            let _ = state_rx.wait_for(LifecycleState::is_terminal).await;
            return Ok(());
        }

        let result = {
            let mut supervisor = self.supervisor.lock().await;
            match supervisor.handle() {
                Some(handle) => {
                    info!("Terminating backend (PID {})", handle.pid());
                    supervisor
                        .terminate(&handle, self.config.shutdown.timeout())
                        .await
                }
                None => {
                    debug!("No backend to terminate");
                    Ok(())
                }
            }
        };
        self.backend_pid.store(0, Ordering::SeqCst);

        if let Err(e) = &result {
            warn!("Backend termination incomplete: {e}");
        }

        self.state.transition(LifecycleState::Stopped);
        result
    }

    pub fn state(&self) -> LifecycleState {
        self.state.state_tx.borrow().clone()
    }

    /// Latest state, coalescing intermediate transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.state_tx.subscribe()
    }

    /// Every applied transition, in order, from the moment of subscribing.
    pub fn events(&self) -> broadcast::Receiver<LifecycleState> {
        self.state.events_tx.subscribe()
    }

    /// Raised once stop() has been called.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// PID of the live backend, if one is running.
    pub fn backend_pid(&self) -> Option<u32> {
        match self.backend_pid.load(Ordering::SeqCst) {
            0 => None,
            pid => Some(pid),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn drive_probe(&self, probe: &mut ReadinessProbe) -> ProbeVerdict {
        while probe.wait_turn().await {
            let attempt_number = probe.verdict().attempts() + 1;
            if attempt_number > 1 {
                self.state.transition(LifecycleState::Probing {
                    attempt: attempt_number,
                });
            }

            let Some(attempt) = probe.attempt().await else {
                break;
            };

            match &attempt.outcome {
                ProbeOutcome::Succeeded { status, latency_ms } => {
                    debug!(
                        "Probe {} answered HTTP {status} in {latency_ms}ms",
                        attempt.attempt_number
                    );
                    break;
                }
                ProbeOutcome::Failed { reason } => {
                    debug!("Probe {} failed: {reason}", attempt.attempt_number);
                    self.state.transition(LifecycleState::Retrying {
                        failed_attempts: attempt.attempt_number,
                    });
                }
                ProbeOutcome::Pending => {}
            }
        }

        probe.verdict()
    }

    /// After `Ready`, an exit nobody asked for means the connection is lost.
    fn watch_backend(&self, mut exits: watch::Receiver<Option<ProcessExit>>) {
        let state = self.state.clone();
        let backend_pid = self.backend_pid.clone();

        tokio::spawn(async move {
            let exit = wait_for_exit(&mut exits).await;
            let _ = backend_pid.compare_exchange(exit.pid, 0, Ordering::SeqCst, Ordering::SeqCst);

            if exit.expected {
                return;
            }

            let error = LauncherError::UnexpectedExit {
                pid: exit.pid,
                code: exit.code,
                location: ErrorLocation::from(Location::caller()),
            };
            error!("{error}");
            state.transition(LifecycleState::Failed {
                reason: FailureReason::classify(&error),
            });
        });
    }

    /// Shutdown cut the launch short; report the state stop() settles on.
    async fn interrupted(&self) -> LifecycleState {
        let mut state_rx = self.state.state_tx.subscribe();
        let _ = state_rx.wait_for(LifecycleState::is_terminal).await;
        self.state()
    }

    async fn fail(&self, error: &LauncherError) -> LifecycleState {
        error!("Backend launch failed: {error}");
        info!("Hint: {}", error.recovery_hint());
        self.fail_with(FailureReason::classify(error)).await
    }

    /// Move to `Failed`, unless a shutdown already took over the launch.
    pub(crate) async fn fail_with(&self, reason: FailureReason) -> LifecycleState {
        if !self.state.transition(LifecycleState::Failed { reason }) && self.shutdown_requested()
        {
            return self.interrupted().await;
        }
        self.state()
    }

    #[cfg(test)]
    pub(crate) fn supervisor(&self) -> &Arc<Mutex<ProcessSupervisor>> {
        &self.supervisor
    }
}

/// State plus an ordered event feed, updated together.
#[derive(Clone)]
struct StateCell {
    state_tx: watch::Sender<LifecycleState>,
    events_tx: broadcast::Sender<LifecycleState>,
}

impl StateCell {
    /// Apply `next` if the state machine allows it. Returns whether it was applied.
    fn transition(&self, next: LifecycleState) -> bool {
        self.state_tx.send_if_modified(|current| {
            if !current.can_transition_to(&next) {
                debug!("Rejected transition {current} -> {next}");
                return false;
            }

            info!("Lifecycle: {current} -> {next}");
            // No subscribers is fine
            let _ = self.events_tx.send(next.clone());
            *current = next;
            true
        })
    }
}

/// Resolves with the exit event. Pends forever if the monitor went away.
async fn wait_for_exit(exits: &mut watch::Receiver<Option<ProcessExit>>) -> ProcessExit {
    let exit = match exits.wait_for(Option::is_some).await {
        Ok(exit) => *exit,
        Err(_) => None,
    };

    match exit {
        Some(exit) => exit,
        None => std::future::pending().await,
    }
}

fn whole_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(elapsed.as_millis() as u64)
}
