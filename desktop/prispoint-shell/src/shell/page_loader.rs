//! Loads the backend page once the lifecycle reports ready.
//!
//! Independent of the readiness probe: a failed load is retried after a
//! fixed delay, up to a bounded number of attempts.

use crate::backend::{LauncherResult, cancelled};

use std::time::Duration;

use prispoint_config::ShellConfig;
use tokio::sync::watch;
use tracing::{info, warn};

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoad {
    /// The backend answered; HTTP error pages still count as loaded
    Loaded { attempts: u32, status: u16 },
    GaveUp { attempts: u32, last_error: String },
    Cancelled { attempts: u32 },
}

pub struct PageLoader {
    client: reqwest::Client,
    retry_delay: Duration,
    max_attempts: u32,
}

impl PageLoader {
    pub fn new(config: &ShellConfig) -> LauncherResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(PAGE_LOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            retry_delay: config.load_retry_delay(),
            max_attempts: config.load_max_attempts.max(1),
        })
    }

    /// Load `url`, retrying transport failures until the attempts run out
    /// or `shutdown` is raised.
    pub async fn load(&self, url: &str, mut shutdown: watch::Receiver<bool>) -> PageLoad {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::select! {
                    biased;
                    _ = cancelled(&mut shutdown) => {
                        return PageLoad::Cancelled { attempts: attempt - 1 };
                    }
                    _ = tokio::time::sleep(self.retry_delay) => {}
                }
            }

            let response = tokio::select! {
                biased;
                _ = cancelled(&mut shutdown) => {
                    return PageLoad::Cancelled { attempts: attempt };
                }
                response = self.client.get(url).send() => response,
            };

            match response {
                Ok(resp) => {
                    info!("Loaded {url} (HTTP {})", resp.status());
                    return PageLoad::Loaded {
                        attempts: attempt,
                        status: resp.status().as_u16(),
                    };
                }
                Err(e) => {
                    warn!(
                        "Page load {attempt}/{} failed: {e}, retrying in {}",
                        self.max_attempts,
                        humantime::format_duration(self.retry_delay)
                    );
                    last_error = e.to_string();
                }
            }
        }

        PageLoad::GaveUp {
            attempts: self.max_attempts,
            last_error,
        }
    }
}
