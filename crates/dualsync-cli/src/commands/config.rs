//! Config command - View and validate dualsync configuration
//!
//! Provides the `dualsync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors
//! 3. Prints the path the configuration is read from

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use dualsync_core::config::Config;

use super::CliContext;
use crate::output::get_formatter;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Validate => execute_validate(ctx),
            ConfigCommand::Path => execute_path(ctx),
        }
    }
}

fn execute_show(ctx: &CliContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if ctx.format.is_json() {
        let json = serde_json::to_value(&ctx.config)
            .context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
        return Ok(());
    }

    let source = if ctx.config_path.exists() {
        ctx.config_path.display().to_string()
    } else {
        "defaults".to_string()
    };
    formatter.success(&format!("Configuration ({source})"));
    formatter.info("");
    let yaml =
        serde_yaml::to_string(&ctx.config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        formatter.info(line);
    }
    Ok(())
}

fn execute_validate(ctx: &CliContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);

    // Re-read the file so parse errors surface instead of silently using defaults
    let config = if ctx.config_path.exists() {
        match Config::load(&ctx.config_path) {
            Ok(config) => config,
            Err(e) => {
                report(ctx, &[format!("{e:#}")]);
                return Ok(());
            }
        }
    } else {
        formatter.warn(&format!(
            "{} does not exist; validating defaults",
            ctx.config_path.display()
        ));
        Config::default()
    };

    let errors: Vec<String> = config.validate().iter().map(ToString::to_string).collect();
    report(ctx, &errors);
    Ok(())
}

fn report(ctx: &CliContext, errors: &[String]) {
    let formatter = get_formatter(ctx.format);
    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": ctx.config_path.display().to_string(),
            "errors": errors,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
    } else {
        formatter.error(&format!("{} problem(s) found", errors.len()));
        for error in errors {
            formatter.info(&format!("- {error}"));
        }
    }
}

fn execute_path(ctx: &CliContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "config_path": ctx.config_path.display().to_string(),
            "exists": ctx.config_path.exists(),
        }));
    } else {
        println!("{}", ctx.config_path.display());
    }
    Ok(())
}
