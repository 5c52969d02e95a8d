use prispoint_config::{Config, ConfigError, LogLevel};
use prispoint_shell::cli::Cli;
use prispoint_shell::logging::{current_log_path, setup_logging};
use prispoint_shell::{
    ConsoleShell, DATA_DIR_NAME, EXIT_BACKEND_FAILED, LifecycleCoordinator, LifecycleState,
    ProcessSupervisor, attach_shell,
};

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    // Load and validate configuration
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = LogLevel::parse_lenient(level);
    }
    config.validate()?;

    let log_dir = config.log_dir(&data_dir()?);
    setup_logging(&log_dir, &config.logging)?;

    info!("Starting PRISPOINT launcher v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Logging to {}",
        current_log_path(&log_dir, &config.logging).display()
    );
    config.log_summary();

    let base_dir = std::env::current_exe()?
        .parent()
        .map(Path::to_path_buf)
        .ok_or("launcher executable has no parent directory")?;

    let supervisor = match &config.backend.output_log {
        Some(file) => ProcessSupervisor::with_output_log(log_dir.join(file)),
        None => ProcessSupervisor::new(),
    };

    let coordinator =
        Arc::new(LifecycleCoordinator::new(config.clone(), base_dir).with_supervisor(supervisor));

    let shell = Arc::new(ConsoleShell::new(
        &config.shell,
        cli.json,
        coordinator.shutdown_signal(),
    )?);
    let shell_task = attach_shell(coordinator.clone(), shell);

    let mut shutdown_rx = install_shutdown_handler();

    let start_task = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.start().await }
    });

    let mut state_rx = coordinator.subscribe();
    let failed = async {
        state_rx
            .wait_for(|state| matches!(state, LifecycleState::Failed { .. }))
            .await
            .is_ok()
    };

    let exit_code = tokio::select! {
        _ = shutdown_requested(&mut shutdown_rx) => ExitCode::SUCCESS,
        true = failed, if cli.exit_on_failure => {
            warn!("Backend failed, exiting");
            ExitCode::from(EXIT_BACKEND_FAILED)
        }
    };

    if let Err(e) = coordinator.stop().await {
        error!("Backend shutdown incomplete: {e}");
    }
    if let Err(e) = start_task.await {
        error!("Start task ended abnormally: {e}");
    }
    if let Err(e) = shell_task.await {
        error!("Shell task ended abnormally: {e}");
    }

    info!("PRISPOINT launcher stopped");
    Ok(exit_code)
}

/// Platform data directory, falling back to the config directory.
fn data_dir() -> Result<PathBuf, ConfigError> {
    match dirs::data_local_dir() {
        Some(dir) => Ok(dir.join(DATA_DIR_NAME)),
        None => Config::config_dir(),
    }
}

/// Setup signal handlers for graceful shutdown.
fn install_shutdown_handler() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();

    #[cfg(unix)]
    std::thread::spawn(move || {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = match Signals::new([SIGINT, SIGTERM]) {
            Ok(signals) => signals,
            Err(e) => {
                error!("Failed to register signal handlers: {e}");
                return;
            }
        };

        for sig in signals.forever() {
            info!("Received signal {sig}, shutting down...");
            if tx.send(()).is_err() {
                break;
            }
        }
    });

    #[cfg(not(unix))]
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
            if tx.send(()).is_err() {
                break;
            }
        }
    });

    rx
}

async fn shutdown_requested(shutdown_rx: &mut mpsc::UnboundedReceiver<()>) {
    if shutdown_rx.recv().await.is_none() {
        warn!("No shutdown signal source available");
        std::future::pending::<()>().await;
    }
}
