use crate::backend::TerminationStrategy;

use std::path::{Path, PathBuf};

/// The backend executable and the address it serves on.
///
/// Built once by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    executable_path: PathBuf,
    host: String,
    port: u16,
    termination: TerminationStrategy,
}

impl BackendTarget {
    pub fn new(
        executable_path: PathBuf,
        host: String,
        port: u16,
        termination: TerminationStrategy,
    ) -> Self {
        Self {
            executable_path,
            host,
            port,
            termination,
        }
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn termination(&self) -> TerminationStrategy {
        self.termination
    }

    /// `http://host:port`, the address the UI shell loads.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}
