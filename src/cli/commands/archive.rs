//! Archive command implementation.
//!
//! Fetches channels and writes one JSON artifact per channel, optionally
//! rebuilding the index afterwards.

use std::io::{self, Write};
use std::path::Path;

use serde_json::json;
use tracing::info;

use crate::archiver::{create_index, ArchiveReport, Archiver, ArchiverConfig};
use crate::cli::{block_on, ArchiveArgs, Cli, OutputFormat};
use crate::config::Config;
use crate::error::Result;

use super::slack_client;

/// Run the archive command.
///
/// An `--all` run succeeds even when individual channels fail; a run over
/// named channels fails with the first failure's error once every other
/// channel has been written.
pub fn run(cli: &Cli, config: &Config, args: &ArchiveArgs) -> Result<()> {
    let client = slack_client(cli, config)?;
    let archiver_config = run_config(config, cli.archive_dir.as_deref(), args);
    let archive_dir = archiver_config.archive_dir.clone();

    let report = block_on(async {
        let archiver = Archiver::new(client, archiver_config).await?;
        if args.all {
            archiver.archive_all().await
        } else {
            archiver.archive_named(&args.queries()).await
        }
    })??;

    let index = if args.index {
        let path = create_index(&archive_dir)?;
        info!(path = %path.display(), "Index written");
        Some(path)
    } else {
        None
    };

    let mut out = io::stdout().lock();
    write_report(&mut out, cli.output, &report, index.as_deref())?;

    if !args.all {
        if let Some(failure) = report.failures.into_iter().next() {
            return Err(failure.error);
        }
    }
    Ok(())
}

/// Apply command flags on top of the configured defaults.
fn run_config(config: &Config, archive_dir: Option<&Path>, args: &ArchiveArgs) -> ArchiverConfig {
    let mut archiver_config = config.archiver_config(archive_dir);
    if let Some(threads) = args.threads() {
        archiver_config.include_threads = threads;
    }
    args.filter.apply(&mut archiver_config);
    archiver_config
}

fn write_report<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    report: &ArchiveReport,
    index: Option<&Path>,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let failures: Vec<_> = report
                .failures
                .iter()
                .map(|f| {
                    json!({
                        "channel": f.channel,
                        "channel_id": f.channel_id,
                        "error": f.error.to_string(),
                        "cause": f.error.root().to_string(),
                    })
                })
                .collect();
            let output = json!({
                "archived": report.archived,
                "failures": failures,
                "index": index,
            });
            writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text => {
            if report.archived.is_empty() && report.failures.is_empty() {
                writeln!(writer, "No channels to archive.")?;
                return Ok(());
            }

            for done in &report.archived {
                writeln!(
                    writer,
                    "Archived #{} ({} messages, {} replies) -> {}",
                    done.channel,
                    done.message_count,
                    done.reply_count,
                    done.path.display()
                )?;
            }
            for failure in &report.failures {
                writeln!(writer, "Failed #{}: {}", failure.channel, failure.error.root())?;
            }
            if let Some(index) = index {
                writeln!(writer, "Index: {}", index.display())?;
            }
            writeln!(writer)?;
            writeln!(
                writer,
                "{} archived, {} failed",
                report.archived.len(),
                report.failures.len()
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archiver::{ArchivedChannel, ChannelFailure};
    use crate::error::SnatchError;
    use clap::Parser;
    use std::path::PathBuf;

    fn parse(argv: &[&str]) -> ArchiveArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            crate::cli::Commands::Archive(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config::default();
        let args = parse(&["slack-snatch", "archive", "--all", "--no-threads", "--member-only"]);
        let run = run_config(&config, Some(Path::new("/tmp/out")), &args);
        assert!(!run.include_threads);
        assert!(run.member_only);
        assert!(!run.include_archived);
        assert_eq!(run.archive_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_flags_switch_off_configured_filters() {
        let mut config = Config::default();
        config.archive.include_archived = true;
        config.archive.member_only = true;
        config.archive.include_threads = false;

        let args = parse(&["slack-snatch", "archive", "--all"]);
        let run = run_config(&config, None, &args);
        assert!(run.include_archived);
        assert!(run.member_only);
        assert!(!run.include_threads);

        let args = parse(&[
            "slack-snatch",
            "archive",
            "--all",
            "--no-include-archived",
            "--no-member-only",
            "--threads",
        ]);
        let run = run_config(&config, None, &args);
        assert!(!run.include_archived);
        assert!(!run.member_only);
        assert!(run.include_threads);
    }

    #[test]
    fn test_last_of_a_flag_pair_wins() {
        let config = Config::default();
        let args = parse(&[
            "slack-snatch",
            "archive",
            "--all",
            "--no-threads",
            "--threads",
            "--include-archived",
            "--no-include-archived",
        ]);
        let run = run_config(&config, None, &args);
        assert!(run.include_threads);
        assert!(!run.include_archived);
    }

    #[test]
    fn test_text_report() {
        let report = ArchiveReport {
            archived: vec![ArchivedChannel {
                channel: "general".to_string(),
                channel_id: "C1".to_string(),
                path: PathBuf::from("archives/general_20240301_090000.json"),
                message_count: 3,
                reply_count: 2,
            }],
            failures: vec![ChannelFailure {
                channel: "nope".to_string(),
                channel_id: None,
                error: SnatchError::ChannelNotFound {
                    channel: "nope".to_string(),
                },
            }],
        };

        let mut out = Vec::new();
        write_report(&mut out, OutputFormat::Text, &report, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(
            "Archived #general (3 messages, 2 replies) -> archives/general_20240301_090000.json"
        ));
        assert!(text.contains("Failed #nope: Channel not found: nope"));
        assert!(text.ends_with("1 archived, 1 failed\n"));
    }
}
