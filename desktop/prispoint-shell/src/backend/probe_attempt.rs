use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Pending,
    Succeeded { status: u16, latency_ms: u64 },
    Failed { reason: String },
}

/// One readiness check against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub attempt_number: u32,
    pub timestamp: DateTime<Utc>,
    pub outcome: ProbeOutcome,
}

impl ProbeAttempt {
    pub(crate) fn pending(attempt_number: u32) -> Self {
        Self {
            attempt_number,
            timestamp: Utc::now(),
            outcome: ProbeOutcome::Pending,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Succeeded { .. })
    }
}

/// Where a probe sequence stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    InProgress { attempts: u32 },
    Ready { attempts: u32 },
    Exhausted { attempts: u32 },
    Cancelled { attempts: u32 },
}

impl ProbeVerdict {
    pub fn attempts(&self) -> u32 {
        match *self {
            Self::InProgress { attempts }
            | Self::Ready { attempts }
            | Self::Exhausted { attempts }
            | Self::Cancelled { attempts } => attempts,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }
}
