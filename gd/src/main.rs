//! Goal Decomposer
//!
//! CLI entry point: loads credentials and configuration, then runs one
//! interactive decomposition session.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use goal_decomposer::cli::{Cli, get_log_path};
use goal_decomposer::config::Config;
use goal_decomposer::repl;

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Setup tracing subscriber - write to log file, stdout belongs to the prompts
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

/// Load the dotenv file; a missing default `.env` is not an error
fn load_env_file(path: Option<&PathBuf>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).context(format!("Failed to load env file {}", path.display()))?;
            debug!(path = %path.display(), "load_env_file: loaded explicit file");
        }
        None => match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "load_env_file: loaded .env"),
            Err(e) if e.not_found() => debug!("load_env_file: no .env file"),
            Err(e) => warn!(error = %e, "Failed to parse .env file"),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    load_env_file(cli.env_file.as_ref())?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "Goal decomposer loaded config: project={}, judge={}",
        config.evaluation.project_name, config.evaluation.model
    );

    let outcome = repl::run_interactive(&config).await?;
    debug!(?outcome, "main: done");
    Ok(())
}
