//! Search command implementation.
//!
//! Finds messages and thread replies in one artifact by keyword or author.

use std::io::{self, Write};

use crate::cli::{Cli, OutputFormat, SearchArgs};
use crate::error::{Result, SnatchError};
use crate::reader::{load_archive, search_by_user, search_messages, SearchHit};

/// Maximum characters of message text shown per hit in text output.
const PREVIEW_CHARS: usize = 200;

/// Run the search command.
pub fn run(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let archive = load_archive(&args.artifact)?;

    let hits = match (&args.user, &args.keyword) {
        (Some(user), _) => search_by_user(&archive, user),
        (None, Some(keyword)) => search_messages(&archive, keyword, args.case_sensitive),
        (None, None) => {
            return Err(SnatchError::InvalidArgument {
                name: "keyword".to_string(),
                reason: "give a keyword or --user".to_string(),
            })
        }
    };

    let mut out = io::stdout().lock();
    match cli.output {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&hits)?)?;
        }
        OutputFormat::Text => write_hits(&mut out, &hits)?,
    }
    Ok(())
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

fn write_hits<W: Write>(w: &mut W, hits: &[SearchHit<'_>]) -> Result<()> {
    if hits.is_empty() {
        writeln!(w, "No matches found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} matches:", hits.len())?;
    writeln!(w)?;
    for hit in hits {
        let msg = hit.message;
        let marker = if hit.parent_ts.is_some() { "  ↳ " } else { "" };
        writeln!(
            w,
            "{marker}[{}] {}: {}",
            msg.display_time(),
            msg.author(),
            preview(&msg.text)
        )?;
    }
    Ok(())
}
