//! List command implementation.
//!
//! Lists the channels an archive run would see.

use std::io::{self, Write};

use serde::Serialize;

use crate::archiver::Archiver;
use crate::cli::{block_on, Cli, ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::model::Channel;
use crate::users::UserCache;

use super::slack_client;

/// Run the list command.
pub fn run(cli: &Cli, config: &Config, args: &ListArgs) -> Result<()> {
    let client = slack_client(cli, config)?;

    let mut archiver_config = config.archiver_config(cli.archive_dir.as_deref());
    args.filter.apply(&mut archiver_config);

    let archiver = Archiver::with_users(client, UserCache::default(), archiver_config);
    let channels = block_on(archiver.list_channels())??;

    let mut out = io::stdout().lock();
    write_channels(&mut out, cli.output, &channels)?;
    Ok(())
}

/// Summary row for JSON output.
#[derive(Debug, Serialize)]
struct ChannelInfo<'a> {
    id: &'a str,
    name: &'a str,
    is_private: bool,
    is_archived: bool,
    is_member: bool,
    num_members: Option<u64>,
    topic: &'a str,
}

impl<'a> From<&'a Channel> for ChannelInfo<'a> {
    fn from(c: &'a Channel) -> Self {
        Self {
            id: &c.id,
            name: &c.name,
            is_private: c.is_private,
            is_archived: c.is_archived,
            is_member: c.is_member,
            num_members: c.num_members,
            topic: c.topic(),
        }
    }
}

fn write_channels<W: Write>(writer: &mut W, format: OutputFormat, channels: &[Channel]) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output: Vec<_> = channels.iter().map(ChannelInfo::from).collect();
            writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text => {
            if channels.is_empty() {
                writeln!(writer, "No channels found.")?;
                return Ok(());
            }

            writeln!(writer, "Channels ({} found):", channels.len())?;
            writeln!(writer)?;
            for c in channels {
                let mut flags = Vec::new();
                if c.is_private {
                    flags.push("private");
                }
                if c.is_archived {
                    flags.push("archived");
                }
                if !c.is_member {
                    flags.push("not a member");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                let members = c
                    .num_members
                    .map(|n| format!(" ({n} members)"))
                    .unwrap_or_default();
                writeln!(writer, "  {:<12} #{}{members}{flags}", c.id, c.name)?;
            }
        }
    }
    Ok(())
}
