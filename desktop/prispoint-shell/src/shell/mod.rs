//! UI shell seam: how lifecycle transitions reach the user.

mod console;
mod page_loader;

pub use console::ConsoleShell;
pub use page_loader::{PageLoad, PageLoader};

use crate::backend::{
    FailureReason, LifecycleCoordinator, LifecycleState, LifecycleStatus, build_status,
};

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

/// Receives lifecycle notifications. Calls arrive in transition order from
/// a single task, so implementations must not block.
pub trait UiShell: Send + Sync + 'static {
    /// Every applied transition, including the ones below.
    fn on_state_changed(&self, _status: &LifecycleStatus) {}

    /// The backend answered and its page can be loaded.
    fn on_ready(&self, status: &LifecycleStatus);

    fn on_failed(&self, reason: &FailureReason);
}

/// Forward lifecycle transitions to `shell` until `Stopped`.
///
/// The current state is delivered first, so attaching after `start()` has
/// begun still reports where the lifecycle stands.
pub fn attach_shell(
    coordinator: Arc<LifecycleCoordinator>,
    shell: Arc<dyn UiShell>,
) -> JoinHandle<()> {
    let mut events = coordinator.events();
    let initial = coordinator.state();

    tokio::spawn(async move {
        let mut last = initial.clone();
        dispatch(shell.as_ref(), &initial, coordinator.backend_pid());
        if initial.is_terminal() {
            return;
        }

        loop {
            match events.recv().await {
                Ok(state) => {
                    // The snapshot may already include the first event
                    if state == last {
                        continue;
                    }
                    dispatch(shell.as_ref(), &state, coordinator.backend_pid());
                    if state.is_terminal() {
                        break;
                    }
                    last = state;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("UI shell skipped {missed} lifecycle events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn dispatch(shell: &dyn UiShell, state: &LifecycleState, pid: Option<u32>) {
    let status = build_status(state, pid);
    shell.on_state_changed(&status);

    match state {
        LifecycleState::Ready { .. } => shell.on_ready(&status),
        LifecycleState::Failed { reason } => shell.on_failed(reason),
        _ => {}
    }
}
