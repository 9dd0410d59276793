//! Property-based tests for the artifact model and message markup.
//!
//! Uses proptest to generate archives and message text, checking that
//! artifacts survive a disk round trip and that rendering never panics.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use slack_snatch::export::markup::{parse, MentionResolver};
use slack_snatch::export::{render_html, ExportFormat, ExportOptions, export_to_string};
use slack_snatch::model::{compare_ts, parse_ts, Archive, ArchiveMetadata, Channel, Message};
use slack_snatch::reader::load_archive;
use slack_snatch::util::atomic_write;
use tempfile::TempDir;

/// A Slack `ts`: unix seconds with a six-digit microsecond fraction.
fn ts_strategy() -> impl Strategy<Value = String> {
    (1_000_000_000i64..2_000_000_000, 0u32..1_000_000).prop_map(|(s, us)| format!("{s}.{us:06}"))
}

fn reply_strategy(parent: String) -> impl Strategy<Value = Message> {
    ("U[A-Z0-9]{4}", ".{0,40}", ts_strategy()).prop_map(move |(user, text, ts)| {
        Message::new(user, text, ts).in_thread(parent.clone())
    })
}

fn message_strategy() -> impl Strategy<Value = Message> {
    (
        prop::option::of("U[A-Z0-9]{4}"),
        ".{0,80}",
        ts_strategy(),
    )
        .prop_flat_map(|(user, text, ts)| {
            let replies = prop::collection::vec(reply_strategy(ts.clone()), 0..4);
            (Just((user, text, ts)), replies)
        })
        .prop_map(|((user, text, ts), replies)| {
            let mut msg = Message {
                user,
                text,
                ts,
                ..Message::default()
            };
            if !replies.is_empty() {
                msg.reply_count = Some(replies.len() as u32);
                msg.thread_ts = Some(msg.ts.clone());
            }
            msg.thread_messages = replies;
            msg
        })
}

fn archive_strategy() -> impl Strategy<Value = Archive> {
    prop::collection::vec(message_strategy(), 0..20).prop_map(|messages| {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Archive::new(
            ArchiveMetadata::from_channel(&Channel::new("C0GENERAL1", "general"), at),
            messages,
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Written then read back, an artifact keeps its count and its messages.
    #[test]
    fn artifact_round_trip_keeps_count(archive in archive_strategy()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("general_20240301_090000.json");
        atomic_write(&path, &serde_json::to_vec_pretty(&archive).unwrap()).unwrap();

        let loaded = load_archive(&path).unwrap();
        prop_assert_eq!(loaded.message_count, loaded.messages.len());
        prop_assert_eq!(loaded.reply_count(), archive.reply_count());
        prop_assert_eq!(loaded, archive);
    }

    /// Timestamp ordering agrees with the instant each `ts` denotes.
    #[test]
    fn compare_ts_matches_time_order(a in ts_strategy(), b in ts_strategy()) {
        let by_time = parse_ts(&a).unwrap().cmp(&parse_ts(&b).unwrap());
        prop_assert_eq!(compare_ts(&a, &b), by_time);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The markup tokenizer accepts any input.
    #[test]
    fn markup_parse_never_panics(text in ".*") {
        let _ = parse(&text);
        let _ = MentionResolver::default().plain(&text);
    }

    /// Rendered HTML never carries a raw tag from message text.
    #[test]
    fn html_text_is_escaped(body in "[a-z ]{0,10}", tag in "(script|img|iframe)") {
        let text = format!("{body}&lt;{tag}&gt;{body}");
        let html = render_html(&text, &MentionResolver::default());
        let raw_tag = format!("<{}", tag);
        prop_assert!(!html.contains(&raw_tag));
    }

    /// Every format renders any generated archive.
    #[test]
    fn every_format_renders(archive in archive_strategy()) {
        for format in [ExportFormat::Html, ExportFormat::Markdown, ExportFormat::Text, ExportFormat::Csv] {
            prop_assert!(export_to_string(&archive, format, &ExportOptions::default()).is_ok());
        }
    }
}
