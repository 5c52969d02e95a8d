/// The supervisor's record of a spawned backend.
///
/// Callers receive copies; only the supervisor flips `running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: u32,
    running: bool,
}

impl ProcessHandle {
    pub(crate) fn new(pid: u32) -> Self {
        Self { pid, running: true }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.running = false;
    }
}

/// Published once when the backend process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub pid: u32,
    /// None when the process was killed by a signal
    pub code: Option<i32>,
    /// True when the exit followed a terminate request
    pub expected: bool,
}
