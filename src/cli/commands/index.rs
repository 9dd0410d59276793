//! Index command implementation.

use crate::archiver::create_index;
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::Result;

/// Run the index command.
pub fn run(cli: &Cli, config: &Config) -> Result<()> {
    let dir = config.archive_dir(cli.archive_dir.as_deref());
    let path = create_index(&dir)?;

    match cli.output {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "index": path }));
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Index written to {}", path.display());
            }
        }
    }
    Ok(())
}
