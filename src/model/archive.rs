//! Archive artifacts and the index that summarizes them.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Channel, Message, UnknownFields};

/// File name of the index written into the archive directory.
pub const INDEX_FILENAME: &str = "INDEX.json";

/// Channel attributes captured alongside the messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// When the archive run started.
    pub archived_at: DateTime<Utc>,
    /// Channel identifier.
    pub channel_id: String,
    /// Channel name.
    pub channel_name: String,
    /// Channel topic.
    #[serde(default)]
    pub channel_topic: String,
    /// Channel purpose.
    #[serde(default)]
    pub channel_purpose: String,
    /// Whether the channel is private.
    #[serde(default)]
    pub is_private: bool,
    /// Whether the channel was archived at capture time.
    #[serde(default)]
    pub is_archived: bool,
    /// Whether the bot was a member at capture time.
    #[serde(default)]
    pub is_member: bool,
    /// Channel creation time in unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    /// Member count at capture time.
    #[serde(default)]
    pub member_count: u64,
    /// Unknown fields for forward compatibility.
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl ArchiveMetadata {
    /// Capture metadata from a channel at the given instant.
    pub fn from_channel(channel: &Channel, archived_at: DateTime<Utc>) -> Self {
        Self {
            archived_at,
            channel_id: channel.id.clone(),
            channel_name: channel.name.clone(),
            channel_topic: channel.topic().to_string(),
            channel_purpose: channel.purpose().to_string(),
            is_private: channel.is_private,
            is_archived: channel.is_archived,
            is_member: channel.is_member,
            created: channel.created,
            member_count: channel.num_members.unwrap_or(0),
            extra: UnknownFields::new(),
        }
    }
}

/// One channel's archived state: metadata, ordered messages and their count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    /// Channel metadata.
    pub metadata: ArchiveMetadata,
    /// Top-level messages, oldest first, with replies attached.
    pub messages: Vec<Message>,
    /// Number of top-level messages.
    pub message_count: usize,
}

impl Archive {
    /// Build an archive; `message_count` is derived from `messages`.
    pub fn new(metadata: ArchiveMetadata, messages: Vec<Message>) -> Self {
        let message_count = messages.len();
        Self {
            metadata,
            messages,
            message_count,
        }
    }

    /// Whether the stored count agrees with the message list.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.message_count == self.messages.len()
    }

    /// Number of thread replies across all messages.
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.messages.iter().map(|m| m.thread_messages.len()).sum()
    }

    /// Iterate over every record: each message followed by its replies.
    pub fn all_records(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .flat_map(|m| std::iter::once(m).chain(m.thread_messages.iter()))
    }
}

/// Summary of one artifact, as listed in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Artifact file name.
    pub filename: String,
    /// Channel name.
    pub channel_name: String,
    /// Channel identifier.
    pub channel_id: String,
    /// Number of top-level messages.
    pub message_count: usize,
    /// When the artifact was captured.
    pub archived_at: DateTime<Utc>,
    /// Path to the artifact.
    pub file_path: String,
}

impl IndexEntry {
    /// Summarize an archive stored at `path`.
    pub fn from_archive(path: &Path, archive: &Archive) -> Self {
        Self {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            channel_name: archive.metadata.channel_name.clone(),
            channel_id: archive.metadata.channel_id.clone(),
            message_count: archive.message_count,
            archived_at: archive.metadata.archived_at,
            file_path: path.display().to_string(),
        }
    }
}

/// The index file: every artifact in the archive directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveIndex {
    /// When the index was generated.
    pub created_at: DateTime<Utc>,
    /// One entry per artifact, in file name order.
    pub archives: Vec<IndexEntry>,
}
