//! Headless shell for terminals and service managers.

use crate::backend::{FailureReason, LauncherResult, LifecycleStatus};
use crate::shell::{PageLoad, PageLoader, UiShell};

use std::sync::Arc;

use prispoint_config::ShellConfig;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Prints lifecycle progress and loads the backend page once it is ready.
///
/// With `json` set every transition is printed to stdout as one JSON line;
/// human-readable output goes to stderr either way.
pub struct ConsoleShell {
    loader: Arc<PageLoader>,
    json: bool,
    shutdown: watch::Receiver<bool>,
}

impl ConsoleShell {
    pub fn new(
        config: &ShellConfig,
        json: bool,
        shutdown: watch::Receiver<bool>,
    ) -> LauncherResult<Self> {
        Ok(Self {
            loader: Arc::new(PageLoader::new(config)?),
            json,
            shutdown,
        })
    }
}

impl UiShell for ConsoleShell {
    fn on_state_changed(&self, status: &LifecycleStatus) {
        if !self.json {
            debug!("Lifecycle status: {}", status.state);
            return;
        }

        match serde_json::to_string(status) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("Failed to serialize lifecycle status: {e}"),
        }
    }

    fn on_ready(&self, status: &LifecycleStatus) {
        let Some(url) = status.url.clone() else {
            warn!("Ready status without a URL");
            return;
        };

        eprintln!("PRISPOINT is running at {url}");

        let loader = self.loader.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            match loader.load(&url, shutdown).await {
                PageLoad::Loaded { attempts, status } => {
                    info!("Page loaded after {attempts} attempt(s) (HTTP {status})");
                }
                PageLoad::GaveUp {
                    attempts,
                    last_error,
                } => {
                    error!("Giving up on {url} after {attempts} attempts: {last_error}");
                    eprintln!("The page at {url} could not be loaded.");
                }
                PageLoad::Cancelled { .. } => debug!("Page load cancelled by shutdown"),
            }
        });
    }

    fn on_failed(&self, reason: &FailureReason) {
        eprintln!("{}", reason.message());
        eprintln!("{}", reason.recovery_hint());
    }
}
