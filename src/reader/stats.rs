//! Aggregate statistics for one artifact.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::Archive;

/// How many authors [`ArchiveStats::top_authors`] keeps.
pub const TOP_AUTHOR_LIMIT: usize = 10;

/// One author's message count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCount {
    /// Display name (or raw ID when unresolved).
    pub name: String,
    /// Top-level messages written.
    pub messages: usize,
}

/// Statistics over an artifact's top-level messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveStats {
    /// Channel name.
    pub channel_name: String,
    /// Top-level message count.
    pub total_messages: usize,
    /// Distinct authors of top-level messages.
    pub unique_authors: usize,
    /// Messages that start a thread with attached replies.
    pub total_threads: usize,
    /// Thread replies across all threads.
    pub total_replies: usize,
    /// Member count recorded at capture time.
    pub member_count: u64,
    /// Earliest message time.
    pub earliest: Option<DateTime<Utc>>,
    /// Latest message time.
    pub latest: Option<DateTime<Utc>>,
    /// Most active authors, by count descending then name.
    pub top_authors: Vec<AuthorCount>,
    /// When the artifact was captured.
    pub archived_at: DateTime<Utc>,
    /// Messages per UTC day, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_day: Option<BTreeMap<NaiveDate, usize>>,
}

impl ArchiveStats {
    /// Compute statistics for an archive.
    #[must_use]
    pub fn from_archive(archive: &Archive, by_day: bool) -> Self {
        let mut authors: IndexMap<&str, usize> = IndexMap::new();
        let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        let mut earliest: Option<DateTime<Utc>> = None;
        let mut latest: Option<DateTime<Utc>> = None;

        for msg in &archive.messages {
            *authors.entry(msg.author()).or_insert(0) += 1;

            if let Some(ts) = msg.timestamp() {
                earliest = Some(earliest.map_or(ts, |e| e.min(ts)));
                latest = Some(latest.map_or(ts, |l| l.max(ts)));
                *days.entry(ts.date_naive()).or_insert(0) += 1;
            }
        }

        let mut top_authors: Vec<AuthorCount> = authors
            .iter()
            .map(|(name, count)| AuthorCount {
                name: (*name).to_string(),
                messages: *count,
            })
            .collect();
        top_authors.sort_by(|a, b| b.messages.cmp(&a.messages).then_with(|| a.name.cmp(&b.name)));
        top_authors.truncate(TOP_AUTHOR_LIMIT);

        Self {
            channel_name: archive.metadata.channel_name.clone(),
            total_messages: archive.messages.len(),
            unique_authors: authors.len(),
            total_threads: archive
                .messages
                .iter()
                .filter(|m| !m.thread_messages.is_empty())
                .count(),
            total_replies: archive.reply_count(),
            member_count: archive.metadata.member_count,
            earliest,
            latest,
            top_authors,
            archived_at: archive.metadata.archived_at,
            by_day: by_day.then_some(days),
        }
    }

    /// Time between the earliest and latest message.
    #[must_use]
    pub fn span(&self) -> Option<chrono::Duration> {
        Some(self.latest? - self.earliest?)
    }
}
