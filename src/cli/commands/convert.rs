//! Convert command implementation.
//!
//! Renders an artifact into one format, or into every presentation format
//! with `-f all`.

use crate::cli::{Cli, ConvertArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Result, SnatchError};
use crate::export::{convert_archive, ExportFormat, ExportOptions};

/// Run the convert command.
pub fn run(cli: &Cli, config: &Config, args: &ConvertArgs) -> Result<()> {
    let selection = args
        .format
        .as_deref()
        .unwrap_or(&config.convert.default_format);
    let formats = ExportFormat::parse_selection(selection).ok_or_else(|| {
        SnatchError::InvalidArgument {
            name: "format".to_string(),
            reason: format!("'{selection}' is not one of html, markdown, text, csv, all"),
        }
    })?;

    let options = ExportOptions::default()
        .with_threads(!args.no_threads)
        .with_system(!args.no_system);

    let written = convert_archive(&args.artifact, &formats, args.out.as_deref(), &options)?;

    match cli.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&written)?);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                for path in &written {
                    println!("Wrote {}", path.display());
                }
            }
        }
    }
    Ok(())
}
