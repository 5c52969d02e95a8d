mod backend_target;
mod error;
mod failure_reason;
mod lifecycle;
mod lifecycle_state;
mod probe;
mod probe_attempt;
mod process_handle;
mod status;
mod supervisor;
mod termination;

pub mod platform;

pub use backend_target::BackendTarget;
pub use error::{LauncherError, Result as LauncherResult};
pub use failure_reason::FailureReason;
pub use lifecycle::LifecycleCoordinator;
pub use lifecycle_state::LifecycleState;
pub use platform::{Platform, resolve};
pub use probe::ReadinessProbe;
pub use probe_attempt::{ProbeAttempt, ProbeOutcome, ProbeVerdict};
pub use process_handle::{ProcessExit, ProcessHandle};
pub use status::{LifecycleStatus, build_status};
pub use supervisor::{ProcessSupervisor, SpawnedBackend};
pub use termination::TerminationStrategy;

pub(crate) use probe::cancelled;
#[cfg(test)]
pub(crate) use termination::taskkill_result;
