use crate::backend::{FailureReason, LifecycleState};

use serde::Serialize;

/// Snapshot of the lifecycle handed to the UI shell.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleStatus {
    pub state: String,
    pub url: Option<String>,
    pub pid: Option<u32>,
    pub failure: Option<FailureReason>,
    pub error: Option<String>,
    pub recovery_hint: Option<String>,
    pub is_ready: bool,
}

/// Build a status snapshot from the state and the backend PID, if any.
pub fn build_status(state: &LifecycleState, pid: Option<u32>) -> LifecycleStatus {
    let (url, failure) = match state {
        LifecycleState::Ready { url } => (Some(url.clone()), None),
        LifecycleState::Failed { reason } => (None, Some(reason.clone())),
        _ => (None, None),
    };

    LifecycleStatus {
        state: state.to_string(),
        url,
        pid,
        error: failure.as_ref().map(FailureReason::message),
        recovery_hint: failure.as_ref().map(|r| r.recovery_hint().to_string()),
        failure,
        is_ready: matches!(state, LifecycleState::Ready { .. }),
    }
}
