//! Stats command implementation.
//!
//! Displays statistics for one artifact, or totals for the archive
//! directory when no artifact is given.

use std::io::{self, Write};

use crate::cli::{Cli, OutputFormat, StatsArgs};
use crate::config::Config;
use crate::error::Result;
use crate::reader::{archive_stats, load_archive, ArchiveStats, DirectoryStats};

/// Run the stats command.
pub fn run(cli: &Cli, config: &Config, args: &StatsArgs) -> Result<()> {
    let mut out = io::stdout().lock();

    match &args.artifact {
        Some(path) => {
            let archive = load_archive(path)?;
            let stats = ArchiveStats::from_archive(&archive, args.by_day);
            match cli.output {
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
                }
                OutputFormat::Text => write_archive_stats(&mut out, &stats)?,
            }
        }
        None => {
            let dir = config.archive_dir(cli.archive_dir.as_deref());
            let stats = archive_stats(&dir)?;
            match cli.output {
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
                }
                OutputFormat::Text => write_directory_stats(&mut out, &stats)?,
            }
        }
    }
    Ok(())
}

fn write_archive_stats<W: Write>(w: &mut W, stats: &ArchiveStats) -> Result<()> {
    writeln!(w, "Channel: #{}", stats.channel_name)?;
    writeln!(w, "Archived: {}", stats.archived_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(w)?;
    writeln!(w, "Messages: {:>8}", stats.total_messages)?;
    writeln!(w, "Authors:  {:>8}", stats.unique_authors)?;
    writeln!(w, "Threads:  {:>8}", stats.total_threads)?;
    writeln!(w, "Replies:  {:>8}", stats.total_replies)?;
    writeln!(w, "Members:  {:>8}", stats.member_count)?;

    if let (Some(first), Some(last)) = (stats.earliest, stats.latest) {
        writeln!(w)?;
        writeln!(
            w,
            "Range: {} to {}",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        )?;
        if let Some(span) = stats.span() {
            writeln!(w, "Span:  {} days", span.num_days())?;
        }
    }

    if !stats.top_authors.is_empty() {
        writeln!(w)?;
        writeln!(w, "Top authors:")?;
        let width = stats
            .top_authors
            .iter()
            .map(|a| a.name.chars().count())
            .max()
            .unwrap_or(0);
        for author in &stats.top_authors {
            writeln!(w, "  {:<width$}  {:>6}", author.name, author.messages)?;
        }
    }

    if let Some(days) = &stats.by_day {
        writeln!(w)?;
        writeln!(w, "By day:")?;
        for (day, count) in days {
            writeln!(w, "  {day}  {count:>6}")?;
        }
    }
    Ok(())
}

fn write_directory_stats<W: Write>(w: &mut W, stats: &DirectoryStats) -> Result<()> {
    writeln!(w, "Archive directory: {}", stats.directory.display())?;
    writeln!(w)?;
    writeln!(w, "Artifacts: {:>8}", stats.total_archives)?;
    writeln!(w, "Messages:  {:>8}", stats.total_messages)?;
    writeln!(w, "Size:      {:>8.2} MiB", stats.total_size_mb)?;

    if !stats.channels.is_empty() {
        writeln!(w)?;
        writeln!(w, "Channels:")?;
        for (name, count) in &stats.channels {
            writeln!(w, "  #{name}: {count}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Archive, ArchiveMetadata, Channel, Message};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_text_stats_with_days() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut first = Message::new("U1", "a", "1709251200.000100");
        first.user_name = Some("Alice".to_string());
        let mut second = Message::new("U2", "b", "1709337600.000200");
        second.user_name = Some("Bob".to_string());
        let archive = Archive::new(
            ArchiveMetadata::from_channel(&Channel::new("C1", "general"), at),
            vec![first, second],
        );

        let stats = ArchiveStats::from_archive(&archive, true);
        let mut out = Vec::new();
        write_archive_stats(&mut out, &stats).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Channel: #general\n"));
        assert!(text.contains("Messages:        2\n"));
        assert!(text.contains("Span:  1 days\n"));
        assert!(text.contains("  2024-03-01       1\n"));
        assert!(text.contains("  2024-03-02       1\n"));
    }
}
