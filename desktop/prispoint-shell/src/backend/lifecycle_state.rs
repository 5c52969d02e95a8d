use crate::backend::FailureReason;

/// Current state of the backend lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing has been launched yet
    NotStarted,
    /// Resolving the target and spawning the backend
    Starting,
    /// Readiness attempt in flight
    Probing { attempt: u32 },
    /// Last attempt failed, waiting for the next one
    Retrying { failed_attempts: u32 },
    /// Backend answered and the UI may load it
    Ready { url: String },
    /// Launch or connection failed; only shutdown remains
    Failed { reason: FailureReason },
    /// Terminating the backend
    ShuttingDown,
    /// Terminal
    Stopped,
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Starting => "starting",
            Self::Probing { .. } => "probing",
            Self::Retrying { .. } => "retrying",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Probing or waiting between attempts.
    pub fn is_probing(&self) -> bool {
        matches!(self, Self::Probing { .. } | Self::Retrying { .. })
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: &LifecycleState) -> bool {
        use LifecycleState::*;

        match (self, next) {
            (Stopped, _) => false,
            (ShuttingDown, Stopped) => true,
            (ShuttingDown, _) => false,
            (_, ShuttingDown) => true,

            (NotStarted, Starting) => true,
            (Starting, Probing { .. }) | (Starting, Failed { .. }) => true,

            (Probing { .. }, Retrying { .. }) => true,
            (Retrying { .. }, Probing { .. }) => true,
            (Probing { .. } | Retrying { .. }, Ready { .. }) => true,
            (Probing { .. } | Retrying { .. }, Failed { .. }) => true,

            (Ready { .. }, Failed { .. }) => true,

            _ => false,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probing { attempt } => write!(f, "probing (attempt {attempt})"),
            Self::Retrying { failed_attempts } => {
                write!(f, "retrying ({failed_attempts} failed)")
            }
            other => f.write_str(other.name()),
        }
    }
}
