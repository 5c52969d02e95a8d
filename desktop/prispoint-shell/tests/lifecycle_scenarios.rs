//! End-to-end launch scenarios with script backends and mock endpoints.
#![cfg(unix)]

mod common;

use common::{
    RecordingShell, closed_port, config, coordinator, drain, process_alive, wait_for_state,
    wait_until_gone, write_backend,
};

use prispoint_shell::{FailureReason, LifecycleState, attach_shell};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(10);

async fn ready_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

async fn requests(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

fn is_ready(state: &LifecycleState) -> bool {
    matches!(state, LifecycleState::Ready { .. })
}

fn is_failed(state: &LifecycleState) -> bool {
    matches!(state, LifecycleState::Failed { .. })
}

#[tokio::test]
async fn test_missing_binary_fails_without_probing() {
    let dir = TempDir::new().unwrap();
    let server = ready_server().await;
    let coordinator = coordinator(config(dir.path(), server.address().port(), 100, 5));
    let mut events = coordinator.events();

    let state = coordinator.start().await;

    assert_eq!(
        state,
        LifecycleState::Failed {
            reason: FailureReason::BackendNotStarted {
                detail: "executable not found".into()
            }
        }
    );
    assert_eq!(requests(&server).await, 0);
    assert!(!drain(&mut events).iter().any(LifecycleState::is_probing));
    assert_eq!(coordinator.backend_pid(), None);

    coordinator.stop().await.unwrap();
    assert_eq!(coordinator.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn test_unresponsive_backend_fails_after_max_attempts() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "exec sleep 30");
    let coordinator = coordinator(config(dir.path(), closed_port(), 1000, 5));
    let mut events = coordinator.events();
    let started = Instant::now();

    let state = coordinator.start().await;

    assert!(started.elapsed() >= Duration::from_millis(5000));
    assert_eq!(
        state,
        LifecycleState::Failed {
            reason: FailureReason::BackendNotResponding { attempts: 5 }
        }
    );

    let seen = drain(&mut events);
    let probes: Vec<_> = seen
        .iter()
        .filter(|s| matches!(s, LifecycleState::Probing { .. }))
        .collect();
    assert_eq!(probes.len(), 5);
    assert_eq!(probes.last(), Some(&&LifecycleState::Probing { attempt: 5 }));
    assert!(!seen.iter().any(is_ready));

    let pid = coordinator.backend_pid().unwrap();
    coordinator.stop().await.unwrap();
    assert!(wait_until_gone(pid, Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_ready_on_third_attempt_stops_probing() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "exec sleep 30");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let coordinator = coordinator(config(dir.path(), server.address().port(), 200, 5));
    let mut events = coordinator.events();

    let state = coordinator.start().await;

    assert_eq!(
        state,
        LifecycleState::Ready {
            url: format!("http://127.0.0.1:{}", server.address().port())
        }
    );
    assert_eq!(requests(&server).await, 3);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(requests(&server).await, 3);

    let seen = drain(&mut events);
    assert_eq!(
        seen.iter()
            .filter(|s| matches!(s, LifecycleState::Retrying { .. }))
            .count(),
        2
    );

    coordinator.stop().await.unwrap();
    assert_eq!(coordinator.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn test_backend_exit_after_ready_reports_connection_lost() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "sleep 1\nexit 3");
    let server = ready_server().await;
    let coordinator = Arc::new(coordinator(config(
        dir.path(),
        server.address().port(),
        200,
        5,
    )));
    let shell = Arc::new(RecordingShell::default());
    let shell_task = attach_shell(coordinator.clone(), shell.clone());

    let state = coordinator.start().await;
    assert!(is_ready(&state));

    let state = wait_for_state(&coordinator, WAIT, is_failed).await;
    assert_eq!(
        state,
        LifecycleState::Failed {
            reason: FailureReason::ConnectionLost { code: Some(3) }
        }
    );

    coordinator.stop().await.unwrap();
    tokio::time::timeout(WAIT, shell_task).await.unwrap().unwrap();

    assert_eq!(shell.ready.lock().unwrap().len(), 1);
    assert_eq!(
        *shell.failed.lock().unwrap(),
        vec![FailureReason::ConnectionLost { code: Some(3) }]
    );
    assert_eq!(
        shell.states.lock().unwrap().last().map(String::as_str),
        Some("stopped")
    );
}

#[tokio::test]
async fn test_stop_during_probing_cancels_and_terminates() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "exec sleep 30");
    let coordinator = Arc::new(coordinator(config(dir.path(), closed_port(), 500, 50)));
    let mut events = coordinator.events();

    let start_task = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.start().await }
    });
    wait_for_state(&coordinator, WAIT, LifecycleState::is_probing).await;
    let pid = coordinator.backend_pid().unwrap();
    assert!(process_alive(pid));

    let stopped_at = Instant::now();
    coordinator.stop().await.unwrap();
    let final_state = tokio::time::timeout(WAIT, start_task).await.unwrap().unwrap();

    assert!(stopped_at.elapsed() < Duration::from_secs(3));
    assert_eq!(final_state, LifecycleState::Stopped);
    assert!(wait_until_gone(pid, Duration::from_secs(2)).await);

    let seen = drain(&mut events);
    assert!(!seen.iter().any(|s| is_ready(s) || is_failed(s)));
    assert_eq!(seen.last(), Some(&LifecycleState::Stopped));

    // Nothing probes after shutdown
    let settled = seen.len();
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(drain(&mut events).len(), 0, "events after {settled} settled");
}

#[tokio::test]
async fn test_backend_exit_during_startup_fails() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "exit 7");
    let coordinator = coordinator(config(dir.path(), closed_port(), 200, 20));

    let state = coordinator.start().await;

    assert_eq!(
        state,
        LifecycleState::Failed {
            reason: FailureReason::ExitedDuringStartup { code: Some(7) }
        }
    );
    assert_eq!(coordinator.backend_pid(), None);
    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn test_unsupported_platform_fails_before_spawn() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "exec sleep 30");
    let coordinator =
        coordinator(config(dir.path(), closed_port(), 200, 5)).with_os("plan9");

    let state = coordinator.start().await;

    assert_eq!(
        state,
        LifecycleState::Failed {
            reason: FailureReason::UnsupportedPlatform { os: "plan9".into() }
        }
    );
    assert_eq!(coordinator.backend_pid(), None);
}

#[tokio::test]
async fn test_concurrent_stops_all_return_once_stopped() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "exec sleep 30");
    let server = ready_server().await;
    let coordinator = coordinator(config(dir.path(), server.address().port(), 200, 5));
    assert!(is_ready(&coordinator.start().await));

    let (first, second, third) =
        tokio::join!(coordinator.stop(), coordinator.stop(), coordinator.stop());

    assert!(first.is_ok() && second.is_ok() && third.is_ok());
    assert_eq!(coordinator.state(), LifecycleState::Stopped);
    // A later call is still a no-op
    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_before_start_prevents_spawn() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "exec sleep 30");
    let coordinator = coordinator(config(dir.path(), closed_port(), 200, 5));

    coordinator.stop().await.unwrap();
    let state = coordinator.start().await;

    assert_eq!(state, LifecycleState::Stopped);
    assert_eq!(coordinator.backend_pid(), None);
}

#[tokio::test]
async fn test_second_start_is_ignored() {
    let dir = TempDir::new().unwrap();
    write_backend(dir.path(), "exec sleep 30");
    let server = ready_server().await;
    let coordinator = coordinator(config(dir.path(), server.address().port(), 200, 5));
    assert!(is_ready(&coordinator.start().await));
    let pid = coordinator.backend_pid();

    let state = coordinator.start().await;

    assert!(is_ready(&state));
    assert_eq!(coordinator.backend_pid(), pid);
    coordinator.stop().await.unwrap();
}
