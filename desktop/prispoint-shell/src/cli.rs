use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "prispoint")]
#[command(about = "Launches the PRISPOINT backend and opens it once it is ready")]
#[command(version)]
pub struct Cli {
    /// Config file (default: $PRISPOINT_CONFIG_DIR/config.toml or ./.prispoint/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level override (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Shut down and exit with status 2 when the backend fails
    #[arg(long)]
    pub exit_on_failure: bool,

    /// Print every lifecycle transition to stdout as a JSON line
    #[arg(long)]
    pub json: bool,
}
