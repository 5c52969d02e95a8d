
use crate::{BackendTarget, TerminationStrategy};

use std::net::TcpListener;
use std::path::PathBuf;

use prispoint_config::ProbeConfig;
use wiremock::MockServer;

pub(crate) fn probe_config(
    initial_delay_ms: u64,
    interval_ms: u64,
    timeout_ms: u64,
    max_attempts: u32,
) -> ProbeConfig {
    ProbeConfig {
        initial_delay_ms,
        interval_ms,
        timeout_ms,
        max_attempts,
        path: "/".into(),
    }
}

pub(crate) fn target_on_port(port: u16) -> BackendTarget {
    BackendTarget::new(
        PathBuf::from("/nonexistent/app"),
        "127.0.0.1".into(),
        port,
        TerminationStrategy::Signal,
    )
}

pub(crate) fn target_for(server: &MockServer) -> BackendTarget {
    target_on_port(server.address().port())
}

/// A local port with nothing listening on it.
pub(crate) fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
