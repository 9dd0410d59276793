//! Channel archiving: fetch, stitch threads, annotate and write artifacts.
//!
//! One archive run processes channels strictly one after another. Every
//! artifact written by a run shares the run's start time in its file name.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::client::SlackApi;
use crate::error::{Result, SnatchError};
use crate::model::{
    compare_ts, readable_ts, Archive, ArchiveIndex, ArchiveMetadata, Channel, Message,
    INDEX_FILENAME,
};
use crate::reader::list_archives;
use crate::users::UserCache;
use crate::util::{atomic_write, sanitize_filename};

/// Format of the capture stamp embedded in artifact file names.
pub const RUN_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Settings for an archive run.
#[derive(Debug, Clone)]
pub struct ArchiverConfig {
    /// Directory artifacts are written into.
    pub archive_dir: PathBuf,
    /// Fetch and attach thread replies.
    pub include_threads: bool,
    /// Consider archived channels when listing.
    pub include_archived: bool,
    /// Only archive channels the bot has joined (all-channels mode).
    pub member_only: bool,
    /// Pause between channels.
    pub channel_delay: Duration,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            archive_dir: PathBuf::from("archives"),
            include_threads: true,
            include_archived: false,
            member_only: false,
            channel_delay: Duration::from_secs(1),
        }
    }
}

/// A channel that was written successfully.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedChannel {
    /// Channel name.
    pub channel: String,
    /// Channel identifier.
    pub channel_id: String,
    /// Artifact path.
    pub path: PathBuf,
    /// Top-level messages written.
    pub message_count: usize,
    /// Thread replies written.
    pub reply_count: usize,
}

/// A channel that was skipped, with the reason.
#[derive(Debug)]
pub struct ChannelFailure {
    /// Requested name or resolved channel name.
    pub channel: String,
    /// Channel identifier, when the channel resolved.
    pub channel_id: Option<String>,
    /// What went wrong.
    pub error: SnatchError,
}

/// Outcome of a multi-channel run.
#[derive(Debug, Default)]
pub struct ArchiveReport {
    /// Channels written, in processing order.
    pub archived: Vec<ArchivedChannel>,
    /// Channels skipped.
    pub failures: Vec<ChannelFailure>,
}

impl ArchiveReport {
    /// Paths of every artifact written.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.archived.iter().map(|a| a.path.as_path())
    }

    /// Whether every channel succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// File name for a channel's artifact.
#[must_use]
pub fn archive_filename(channel_name: &str, stamp: &str) -> String {
    format!("{}_{stamp}.json", sanitize_filename(channel_name))
}

/// Find a channel by ID or name.
///
/// An exact ID match wins. Otherwise the query (leading `#` ignored) must
/// match exactly one channel name.
pub fn resolve_channel<'a>(channels: &'a [Channel], query: &str) -> Result<&'a Channel> {
    let query = query.trim();
    if let Some(channel) = channels.iter().find(|c| c.id == query) {
        return Ok(channel);
    }

    let matches: Vec<&Channel> = channels.iter().filter(|c| c.matches_name(query)).collect();
    match matches.as_slice() {
        [only] => Ok(only),
        [] => Err(SnatchError::ChannelNotFound {
            channel: query.to_string(),
        }),
        many => Err(SnatchError::AmbiguousChannel {
            name: query.trim_start_matches('#').to_string(),
            candidates: many.iter().map(|c| c.id.clone()).collect(),
        }),
    }
}

/// Whether `query` is shaped like a conversation ID (`C…`, `G…`, `D…`).
fn looks_like_channel_id(query: &str) -> bool {
    query.len() >= 9
        && query.starts_with(['C', 'G', 'D'])
        && query.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Drop the echoed parent and order replies oldest first.
fn stitch_replies(parent_ts: &str, mut replies: Vec<Message>) -> Vec<Message> {
    replies.retain(|r| r.ts != parent_ts);
    replies.sort_by(|a, b| compare_ts(&a.ts, &b.ts));
    for reply in &mut replies {
        reply.thread_messages.clear();
    }
    replies
}

/// Rewrite the index file for `dir` from the artifacts currently in it.
pub fn create_index(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let index = ArchiveIndex {
        created_at: Utc::now(),
        archives: list_archives(dir)?,
    };

    let path = dir.join(INDEX_FILENAME);
    let body = serde_json::to_vec_pretty(&index)
        .map_err(|e| SnatchError::serialization("Failed to serialize index", e))?;
    atomic_write(&path, &body)?;

    info!(path = %path.display(), archives = index.archives.len(), "Wrote index");
    Ok(path)
}

/// Drives archive runs against a [`SlackApi`].
#[derive(Debug)]
pub struct Archiver<C> {
    api: C,
    users: UserCache,
    config: ArchiverConfig,
    started_at: DateTime<Utc>,
}

impl<C: SlackApi> Archiver<C> {
    /// Create an archiver and load the user directory.
    pub async fn new(api: C, config: ArchiverConfig) -> Result<Self> {
        let users = UserCache::load(&api).await?;
        info!(users = users.len(), "User directory ready");
        Ok(Self::with_users(api, users, config))
    }

    /// Create an archiver with an already loaded user directory.
    pub fn with_users(api: C, users: UserCache, config: ArchiverConfig) -> Self {
        Self {
            api,
            users,
            config,
            started_at: Utc::now(),
        }
    }

    /// Builder: pin the run start time.
    #[must_use]
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// The underlying API client.
    pub fn api(&self) -> &C {
        &self.api
    }

    /// Run settings.
    pub fn config(&self) -> &ArchiverConfig {
        &self.config
    }

    /// The stamp shared by every file name in this run.
    #[must_use]
    pub fn run_stamp(&self) -> String {
        self.started_at.format(RUN_STAMP_FORMAT).to_string()
    }

    /// Channels eligible for an all-channels run.
    ///
    /// Archived channels are dropped unless `include_archived` is set, and
    /// `member_only` keeps only channels the bot has joined.
    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        let include_archived = self.config.include_archived;
        let mut channels = self.api.list_channels(include_archived).await?;
        channels.retain(|c| include_archived || !c.is_archived);
        if self.config.member_only {
            channels.retain(|c| c.is_member);
        }
        Ok(channels)
    }

    /// Fill in author names and readable timestamps.
    fn annotate(&self, msg: &mut Message) {
        if let Some(user) = msg.user.as_deref() {
            msg.user_name = Some(self.users.resolve(user).to_string());
        }
        if let Some(readable) = readable_ts(&msg.ts) {
            msg.timestamp_readable = Some(readable);
        } else {
            debug!(ts = %msg.ts, "Unparseable message timestamp");
        }
    }

    async fn fetch_replies(&self, channel_id: &str, parent: &Message) -> Result<Vec<Message>> {
        match self.api.fetch_thread(channel_id, &parent.ts).await {
            Ok(replies) => Ok(stitch_replies(&parent.ts, replies)),
            Err(SnatchError::ApiError { code, .. }) if code == "thread_not_found" => {
                warn!(channel_id, ts = %parent.ts, "Thread vanished before it could be fetched");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch a channel and assemble its archive without writing it.
    pub async fn build_archive(&self, channel: &Channel) -> Result<Archive> {
        let info = self.api.channel_info(&channel.id).await?;

        let mut messages = self.api.fetch_history(&channel.id).await?;
        messages.sort_by(|a, b| compare_ts(&a.ts, &b.ts));
        debug!(channel = %info.name, count = messages.len(), "Fetched history");

        let mut threads = 0usize;
        for msg in &mut messages {
            if self.config.include_threads && msg.has_thread() {
                msg.thread_messages = self.fetch_replies(&channel.id, msg).await?;
                threads += 1;
            }
            self.annotate(msg);
            for reply in &mut msg.thread_messages {
                self.annotate(reply);
            }
        }
        if threads > 0 {
            debug!(channel = %info.name, threads, "Attached thread replies");
        }

        // Prefer the listing's name when info omits it (e.g. some DMs).
        let mut info = info;
        if info.name.is_empty() {
            info.name.clone_from(&channel.name);
        }

        Ok(Archive::new(
            ArchiveMetadata::from_channel(&info, self.started_at),
            messages,
        ))
    }

    /// Archive one channel and return the artifact path.
    pub async fn archive_channel(&self, channel: &Channel) -> Result<PathBuf> {
        self.archive_one(channel).await.map(|a| a.path)
    }

    async fn archive_one(&self, channel: &Channel) -> Result<ArchivedChannel> {
        let archive = self
            .build_archive(channel)
            .await
            .map_err(|e| e.for_channel(&channel.name, &channel.id))?;

        let path = self.config.archive_dir.join(archive_filename(
            &archive.metadata.channel_name,
            &self.run_stamp(),
        ));
        serde_json::to_vec_pretty(&archive)
            .map_err(|e| SnatchError::serialization("Failed to serialize archive", e))
            .and_then(|body| atomic_write(&path, &body))
            .map_err(|e| e.for_channel(&channel.name, &channel.id))?;

        info!(
            channel = %channel.name,
            channel_id = %channel.id,
            messages = archive.message_count,
            path = %path.display(),
            "Wrote artifact"
        );

        Ok(ArchivedChannel {
            channel: archive.metadata.channel_name.clone(),
            channel_id: channel.id.clone(),
            path,
            message_count: archive.message_count,
            reply_count: archive.reply_count(),
        })
    }

    /// Archive channels in order, skipping (and reporting) failures.
    ///
    /// Fatal errors (such as a revoked token) abort the run.
    pub async fn archive_channels(&self, channels: &[Channel]) -> Result<ArchiveReport> {
        let mut report = ArchiveReport::default();
        let total = channels.len();
        info!(total, "Starting archive run");

        for (i, channel) in channels.iter().enumerate() {
            if i > 0 && !self.config.channel_delay.is_zero() {
                tokio::time::sleep(self.config.channel_delay).await;
            }
            info!(
                channel = %channel.name,
                channel_id = %channel.id,
                "[{}/{}] Archiving channel",
                i + 1,
                total
            );

            match self.archive_one(channel).await {
                Ok(done) => report.archived.push(done),
                Err(e) if e.is_fatal() => {
                    error!(channel = %channel.name, channel_id = %channel.id, error = %e.root(), "Aborting run");
                    return Err(e);
                }
                Err(e) => {
                    error!(channel = %channel.name, channel_id = %channel.id, error = %e.root(), "Skipping channel");
                    report.failures.push(ChannelFailure {
                        channel: channel.name.clone(),
                        channel_id: Some(channel.id.clone()),
                        error: e,
                    });
                }
            }
        }

        info!(
            archived = report.archived.len(),
            failed = report.failures.len(),
            total,
            "Archive run finished"
        );
        if !report.failures.is_empty() {
            let names: Vec<&str> = report.failures.iter().map(|f| f.channel.as_str()).collect();
            warn!(failed = %names.join(", "), "Some channels were not archived");
        }
        Ok(report)
    }

    /// Archive every eligible channel.
    pub async fn archive_all(&self) -> Result<ArchiveReport> {
        let channels = self.list_channels().await?;
        self.archive_channels(&channels).await
    }

    /// Archive the channels named by ID or name.
    ///
    /// Queries that do not resolve are reported as failures; the rest are
    /// still archived. `member_only` does not apply to explicit requests.
    pub async fn archive_named(&self, queries: &[String]) -> Result<ArchiveReport> {
        let listing = self.api.list_channels(self.config.include_archived).await?;

        let mut selected: Vec<Channel> = Vec::new();
        let mut unresolved: Vec<ChannelFailure> = Vec::new();
        for query in queries {
            match self.resolve(&listing, query).await {
                Ok(channel) => {
                    if !selected.iter().any(|c| c.id == channel.id) {
                        selected.push(channel);
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(channel = %query, error = %e, "Cannot resolve channel");
                    unresolved.push(ChannelFailure {
                        channel: query.clone(),
                        channel_id: None,
                        error: e,
                    });
                }
            }
        }

        let mut report = self.archive_channels(&selected).await?;
        unresolved.append(&mut report.failures);
        report.failures = unresolved;
        Ok(report)
    }

    async fn resolve(&self, listing: &[Channel], query: &str) -> Result<Channel> {
        match resolve_channel(listing, query) {
            Ok(channel) => Ok(channel.clone()),
            Err(SnatchError::ChannelNotFound { .. }) if looks_like_channel_id(query.trim()) => {
                // Not in the listing (e.g. archived, or not listable); ask directly.
                let id = query.trim();
                let channel = self.api.channel_info(id).await.map_err(|e| match e {
                    SnatchError::ChannelNotFound { .. } => SnatchError::ChannelNotFound {
                        channel: id.to_string(),
                    },
                    other => other,
                })?;
                if channel.is_archived && !self.config.include_archived {
                    return Err(SnatchError::ChannelNotFound {
                        channel: id.to_string(),
                    });
                }
                Ok(channel)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn channels() -> Vec<Channel> {
        vec![
            Channel::new("C001", "general"),
            Channel::new("C002", "random"),
            Channel::new("C003", "dup"),
            Channel::new("G004", "dup"),
        ]
    }

    #[test]
    fn test_resolve_by_id_and_name() {
        let list = channels();
        assert_eq!(resolve_channel(&list, "C002").unwrap().name, "random");
        assert_eq!(resolve_channel(&list, "general").unwrap().id, "C001");
        assert_eq!(resolve_channel(&list, "#general").unwrap().id, "C001");
    }

    #[test]
    fn test_resolve_id_wins_over_name() {
        let mut list = channels();
        list.push(Channel::new("C999", "C001"));
        assert_eq!(resolve_channel(&list, "C001").unwrap().name, "general");
    }

    #[test]
    fn test_resolve_errors() {
        let list = channels();
        assert!(matches!(
            resolve_channel(&list, "nope"),
            Err(SnatchError::ChannelNotFound { .. })
        ));
        match resolve_channel(&list, "dup") {
            Err(SnatchError::AmbiguousChannel { candidates, .. }) => {
                assert_eq!(candidates, vec!["C003".to_string(), "G004".to_string()]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_archive_filename() {
        assert_eq!(
            archive_filename("general", "20240301_090000"),
            "general_20240301_090000.json"
        );
        assert_eq!(
            archive_filename("team/ops\\oncall", "20240301_090000"),
            "team-ops-oncall_20240301_090000.json"
        );
    }

    #[test]
    fn test_run_stamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let stamp = at.format(RUN_STAMP_FORMAT).to_string();
        assert_eq!(stamp, "20240301_090507");
    }

    #[test]
    fn test_stitch_replies_drops_parent_and_sorts() {
        let replies = vec![
            Message::new("U1", "parent", "100.000001").with_replies(2),
            Message::new("U3", "second", "100.000010").in_thread("100.000001"),
            Message::new("U2", "first", "100.000002").in_thread("100.000001"),
        ];
        let stitched = stitch_replies("100.000001", replies);
        let texts: Vec<_> = stitched.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_looks_like_channel_id() {
        assert!(looks_like_channel_id("C024BE91L"));
        assert!(looks_like_channel_id("G01ABCDEF"));
        assert!(!looks_like_channel_id("general"));
        assert!(!looks_like_channel_id("C1"));
        assert!(!looks_like_channel_id("Cgeneral99"));
    }
}
