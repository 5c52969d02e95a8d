//! Readiness polling with a bounded attempt budget.

use crate::backend::{
    BackendTarget, LauncherError, LauncherResult, ProbeAttempt, ProbeOutcome, ProbeVerdict,
};

use std::panic::Location;
use std::time::{Duration, Instant};

use error_location::ErrorLocation;
use futures::{Stream, stream};
use prispoint_config::ProbeConfig;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Polls the backend until it answers or the attempt budget runs out.
///
/// Produces attempts lazily through [`ReadinessProbe::next_attempt`], or in
/// two steps via [`ReadinessProbe::wait_turn`] and [`ReadinessProbe::attempt`]. The
/// sequence is finite and cannot be restarted: once it returns `None` the
/// verdict is final. Raising the shutdown flag ends it immediately, even
/// while a request or an interval wait is in flight.
pub struct ReadinessProbe {
    client: reqwest::Client,
    url: String,
    initial_delay: Duration,
    interval: Duration,
    max_attempts: u32,
    issued: u32,
    turn_ready: bool,
    verdict: ProbeVerdict,
    shutdown: watch::Receiver<bool>,
}

impl ReadinessProbe {
    /// Create a probe for `target`.
    ///
    /// The per-attempt timeout must be strictly shorter than the interval so
    /// an attempt never overlaps the next one.
    pub fn new(
        target: &BackendTarget,
        config: &ProbeConfig,
        shutdown: watch::Receiver<bool>,
    ) -> LauncherResult<Self> {
        if config.max_attempts == 0 {
            return Err(LauncherError::ProbeSettings {
                message: "max_attempts must be > 0".into(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if config.timeout().is_zero() || config.timeout() >= config.interval() {
            return Err(LauncherError::ProbeSettings {
                message: format!(
                    "timeout ({}ms) must be > 0 and < interval ({}ms)",
                    config.timeout_ms, config.interval_ms
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // No pooled connections: every attempt is a fresh connection check
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            url: target.url_for(&config.path),
            initial_delay: config.initial_delay(),
            interval: config.interval(),
            max_attempts: config.max_attempts,
            issued: 0,
            turn_ready: false,
            verdict: ProbeVerdict::InProgress { attempts: 0 },
            shutdown,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn verdict(&self) -> ProbeVerdict {
        self.verdict
    }

    /// Wait for the next slot and run one attempt.
    ///
    /// Returns `None` once the sequence has ended; see [`Self::verdict`].
    pub async fn next_attempt(&mut self) -> Option<ProbeAttempt> {
        if !self.wait_turn().await {
            return None;
        }
        self.attempt().await
    }

    /// Wait until the next attempt may be issued.
    ///
    /// The first attempt waits the initial delay; every later turn waits one
    /// interval, including the turn that discovers the budget is spent.
    /// Returns false when the sequence has ended instead.
    pub async fn wait_turn(&mut self) -> bool {
        if self.verdict.is_finished() {
            return false;
        }

        if self.turn_ready {
            return true;
        }

        let wait = if self.issued == 0 {
            self.initial_delay
        } else {
            self.interval
        };

        if !self.pause(wait).await {
            debug!("Readiness probe cancelled after {} attempts", self.issued);
            self.verdict = ProbeVerdict::Cancelled {
                attempts: self.issued,
            };
            return false;
        }

        if self.issued >= self.max_attempts {
            warn!(
                "Readiness probe exhausted after {} attempts against {}",
                self.issued, self.url
            );
            self.verdict = ProbeVerdict::Exhausted {
                attempts: self.issued,
            };
            return false;
        }

        self.turn_ready = true;
        true
    }

    /// Issue one attempt, waiting for its turn first if needed.
    pub async fn attempt(&mut self) -> Option<ProbeAttempt> {
        if !self.wait_turn().await {
            return None;
        }

        self.turn_ready = false;
        self.issued += 1;
        let mut attempt = ProbeAttempt::pending(self.issued);
        debug!(
            "Probe attempt {}/{} against {}",
            self.issued, self.max_attempts, self.url
        );

        let outcome = tokio::select! {
            biased;
            _ = cancelled(&mut self.shutdown) => None,
            outcome = check(&self.client, &self.url) => Some(outcome),
        };

        let Some(outcome) = outcome else {
            debug!("Probe attempt {} cancelled in flight", self.issued);
            self.verdict = ProbeVerdict::Cancelled {
                attempts: self.issued,
            };
            return None;
        };

        attempt.outcome = outcome;
        self.verdict = if attempt.succeeded() {
            ProbeVerdict::Ready {
                attempts: self.issued,
            }
        } else {
            ProbeVerdict::InProgress {
                attempts: self.issued,
            }
        };

        Some(attempt)
    }

    /// Drive the probe as a stream of attempts.
    ///
    /// The stream ends where [`Self::next_attempt`] would return `None`.
    pub fn into_stream(self) -> impl Stream<Item = ProbeAttempt> {
        stream::unfold(self, |mut probe| async move {
            let attempt = probe.next_attempt().await?;
            Some((attempt, probe))
        })
    }

    /// Sleep for `wait`, returning false if shutdown was requested first.
    async fn pause(&mut self, wait: Duration) -> bool {
        tokio::select! {
            biased;
            _ = cancelled(&mut self.shutdown) => false,
            _ = tokio::time::sleep(wait) => true,
        }
    }
}

/// Resolves once the shutdown flag is raised.
pub(crate) async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        // Sender dropped without raising the flag: nothing can cancel any more
        std::future::pending::<()>().await;
    }
}

/// Any HTTP answer below 500 means the backend is serving requests.
async fn check(client: &reqwest::Client, url: &str) -> ProbeOutcome {
    let start = Instant::now();

    match client.get(url).send().await {
        Ok(resp) if !resp.status().is_server_error() => ProbeOutcome::Succeeded {
            status: resp.status().as_u16(),
            latency_ms: start.elapsed().as_millis() as u64,
        },
        Ok(resp) => ProbeOutcome::Failed {
            reason: format!("HTTP {}", resp.status()),
        },
        Err(e) if e.is_timeout() => ProbeOutcome::Failed {
            reason: "request timed out".into(),
        },
        Err(e) => ProbeOutcome::Failed {
            reason: e.to_string(),
        },
    }
}
