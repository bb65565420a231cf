mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use bdaycal_core::config::AppConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bdaycal")]
#[command(about = "Keep a CalDAV birthday calendar in sync with your address book")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/bdaycal/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Debug logging; `status` also lists upcoming birthdays
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, replace and delete birthday events to match the address book
    Sync {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit with an error if any single event failed
        #[arg(long)]
        strict: bool,
    },
    /// Show what a sync would change without changing anything
    Status,
    /// Sync on the configured cron schedule until interrupted
    Daemon,
    /// Show the config path and the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, matches!(cli.command, Commands::Daemon));

    let path = config_path(cli.config.as_deref())?;
    let config = AppConfig::load(&path)?;

    match cli.command {
        Commands::Sync { json, strict } => commands::sync::run(&config, json, strict).await,
        Commands::Status => commands::status::run(&config, cli.verbose).await,
        Commands::Daemon => commands::daemon::run(config).await,
        Commands::Config => commands::config::run(&path, &config),
    }
}

/// Logs go to stderr. Interactive commands only show warnings unless
/// `-v` is given; the daemon logs every pass.
fn init_logging(verbose: bool, daemon: bool) {
    let default_level = match (verbose, daemon) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn config_path(arg: Option<&str>) -> Result<PathBuf> {
    match arg {
        Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).as_ref())),
        None => Ok(AppConfig::config_path()?),
    }
}
