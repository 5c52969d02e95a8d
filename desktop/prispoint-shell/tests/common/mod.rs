#![allow(dead_code)]

use prispoint_config::Config;
use prispoint_shell::{
    BackendTarget, FailureReason, LifecycleCoordinator, LifecycleState, LifecycleStatus,
    TerminationStrategy, UiShell,
};

use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::broadcast;

pub const BACKEND_NAME: &str = "app";

/// Write an executable `/bin/sh` backend named `app` into `dir`.
pub fn write_backend(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join(BACKEND_NAME);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn target(executable: PathBuf, port: u16) -> BackendTarget {
    BackendTarget::new(
        executable,
        "127.0.0.1".into(),
        port,
        TerminationStrategy::Signal,
    )
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Config pointing at `dist_dir` with fast probe timings.
pub fn config(dist_dir: &Path, port: u16, interval_ms: u64, max_attempts: u32) -> Config {
    let mut config = Config::default();
    config.backend.dist_dir = dist_dir.to_string_lossy().into_owned();
    config.backend.unix_executable = BACKEND_NAME.into();
    config.backend.port = port;
    config.probe.initial_delay_ms = 0;
    config.probe.interval_ms = interval_ms;
    config.probe.timeout_ms = interval_ms / 2;
    config.probe.max_attempts = max_attempts;
    config.shutdown.timeout_ms = 2000;
    config
}

pub fn coordinator(config: Config) -> LifecycleCoordinator {
    LifecycleCoordinator::new(config, PathBuf::from("/"))
}

/// Wait until the coordinator reaches a state matching `pred`.
pub async fn wait_for_state(
    coordinator: &LifecycleCoordinator,
    timeout: Duration,
    pred: impl FnMut(&LifecycleState) -> bool,
) -> LifecycleState {
    let mut state_rx = coordinator.subscribe();
    let state = tokio::time::timeout(timeout, state_rx.wait_for(pred))
        .await
        .expect("timed out waiting for lifecycle state")
        .expect("coordinator dropped");
    state.clone()
}

/// Every event received so far.
pub fn drain(events: &mut broadcast::Receiver<LifecycleState>) -> Vec<LifecycleState> {
    let mut seen = Vec::new();
    while let Ok(state) = events.try_recv() {
        seen.push(state);
    }
    seen
}

/// A zombie counts as gone.
pub fn process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }

    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // Field 3, after the parenthesised command name
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            != Some("Z"),
        Err(_) => true,
    }
}

/// Poll for a PID the backend writes to `path`.
pub async fn read_pid_file(path: &Path, timeout: Duration) -> u32 {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(contents) = std::fs::read_to_string(path)
            && let Ok(pid) = contents.trim().parse()
        {
            return pid;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "backend never wrote {}",
            path.display()
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Poll until `pid` is gone or `timeout` passes.
pub async fn wait_until_gone(pid: u32, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    !process_alive(pid)
}

#[derive(Default)]
pub struct RecordingShell {
    pub states: Mutex<Vec<String>>,
    pub ready: Mutex<Vec<LifecycleStatus>>,
    pub failed: Mutex<Vec<FailureReason>>,
}

impl UiShell for RecordingShell {
    fn on_state_changed(&self, status: &LifecycleStatus) {
        self.states.lock().unwrap().push(status.state.clone());
    }

    fn on_ready(&self, status: &LifecycleStatus) {
        self.ready.lock().unwrap().push(status.clone());
    }

    fn on_failed(&self, reason: &FailureReason) {
        self.failed.lock().unwrap().push(reason.clone());
    }
}
