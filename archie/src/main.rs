//! Archie - conversational file assistant
//!
//! CLI entry point: one-shot request or interactive REPL.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info};

use archie::cli::{Cli, OutputFormat, generate_after_help};
use archie::config::Config;
use archie::repl;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("archie")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("archie.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Priority: CLI flags > environment > config file > defaults
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.apply_env_overrides();
    cli.apply_to(&mut config);
    config.validate()?;

    let root = repl::ensure_sandbox(&config.sandbox)?;
    info!(root = %root.display(), model = %config.llm.model, "Archie starting");

    match cli.prompt() {
        Some(prompt) => {
            debug!(format = %cli.format, "main: one-shot request");
            repl::run_once(&config, &prompt, cli.format == OutputFormat::Json).await
        }
        None => {
            debug!("main: no prompt, launching REPL");
            repl::run_interactive(&config).await
        }
    }
}
