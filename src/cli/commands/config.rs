//! Config command implementation.
//!
//! View and initialize slack-snatch configuration.

use std::path::PathBuf;

use crate::cli::{Cli, ConfigAction, ConfigArgs, OutputFormat};
use crate::config::{default_config_path, Config};
use crate::error::{Result, SnatchError};

/// Run the config command.
pub fn run(cli: &Cli, config: &Config, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, config),
        ConfigAction::Init { force } => init_config(cli, *force),
        ConfigAction::Path => show_config_path(cli),
    }
}

/// The file `--config` points at, else the default location.
fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

/// Show the effective configuration, token masked.
fn show_config(cli: &Cli, config: &Config) -> Result<()> {
    let mut effective = config.clone();
    if let Some(token) = cli.token.as_deref().filter(|t| !t.trim().is_empty()) {
        effective.slack.token = Some(token.trim().to_string());
    }
    if let Some(dir) = &cli.archive_dir {
        effective.archive.directory = dir.clone();
    }
    let shown = effective.redacted();

    match cli.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        OutputFormat::Text => {
            let text = toml::to_string_pretty(&shown).map_err(|e| SnatchError::InvalidConfig {
                message: format!("Failed to serialize config: {e}"),
            })?;
            print!("{text}");
            if shown.slack.token.is_none() {
                println!();
                println!("# token not set (pass --token or set SLACK_BOT_TOKEN)");
            }
        }
    }
    Ok(())
}

/// Write a default configuration file.
fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = config_path(cli)?;
    if path.exists() && !force {
        return Err(SnatchError::config(format!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save_to(&path)?;

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::json!({ "created": path })),
        OutputFormat::Text => println!("Created config file: {}", path.display()),
    }
    Ok(())
}

/// Show the configuration file path.
fn show_config_path(cli: &Cli) -> Result<()> {
    let path = config_path(cli)?;
    match cli.output {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "path": path, "exists": path.exists() }));
        }
        OutputFormat::Text => println!("{}", path.display()),
    }
    Ok(())
}
