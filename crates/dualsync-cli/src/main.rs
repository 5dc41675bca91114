//! dualsync CLI - Command-line interface for dualsync
//!
//! Provides commands for:
//! - Running a reconciliation cycle (on demand or time-boxed)
//! - Managing associations between local and remote folders
//! - Viewing sync status and the diagnostics log
//! - Inspecting configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use dualsync_core::config::Config;

mod commands;
mod notifier;
mod output;

use commands::{
    association::AssociationCommand, completions::CompletionsCommand, config::ConfigCommand,
    log::LogCommand, status::StatusCommand, sync::SyncCommand, CliContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "dualsync",
    version,
    about = "Two-way folder synchronization between a local and a remote root"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one reconciliation cycle over every association
    Sync(SyncCommand),
    /// Manage associations
    #[command(subcommand)]
    Association(AssociationCommand),
    /// Show synchronization status
    Status(StatusCommand),
    /// View recent diagnostics entries
    Log(LogCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Filter used when `RUST_LOG` is not set
fn filter_directive(verbose: u8, configured_level: &str) -> &str {
    match verbose {
        0 => configured_level,
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let (config, load_error) = if config_path.exists() {
        match Config::load(&config_path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        }
    } else {
        (Config::default(), None)
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(filter_directive(cli.verbose, &config.logging.level))
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = load_error {
        warn!(
            config_path = %config_path.display(),
            error = %format!("{e:#}"),
            "Falling back to default configuration"
        );
    }

    let ctx = CliContext {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        config,
        config_path,
    };

    match &cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Association(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::Log(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(),
    }
}
