//! Flat row view of an artifact, one row per message or reply.

use serde::Serialize;

use crate::model::{Archive, Message};

/// Column names, in output order.
pub const COLUMNS: &[&str] = &[
    "ts",
    "timestamp",
    "depth",
    "parent_ts",
    "user",
    "user_name",
    "text",
    "reply_count",
];

/// One flattened record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRow {
    /// Raw server timestamp.
    pub ts: String,
    /// RFC 3339 timestamp, empty if unparseable.
    pub timestamp: String,
    /// 0 for top-level messages, 1 for thread replies.
    pub depth: u8,
    /// Parent `ts` for replies, empty otherwise.
    pub parent_ts: String,
    /// Author user ID.
    pub user: String,
    /// Author display name.
    pub user_name: String,
    /// Message body.
    pub text: String,
    /// Reply count reported by the server.
    pub reply_count: u32,
}

impl MessageRow {
    fn from_message(msg: &Message, parent: Option<&Message>) -> Self {
        let timestamp = msg
            .timestamp_readable
            .clone()
            .or_else(|| crate::model::readable_ts(&msg.ts))
            .unwrap_or_default();
        Self {
            ts: msg.ts.clone(),
            timestamp,
            depth: u8::from(parent.is_some()),
            parent_ts: parent.map(|p| p.ts.clone()).unwrap_or_default(),
            user: msg.user.clone().unwrap_or_default(),
            user_name: msg.author().to_string(),
            text: msg.text.clone(),
            reply_count: msg.reply_count.unwrap_or(0),
        }
    }

    /// Field values in [`COLUMNS`] order.
    #[must_use]
    pub fn fields(&self) -> [String; 8] {
        [
            self.ts.clone(),
            self.timestamp.clone(),
            self.depth.to_string(),
            self.parent_ts.clone(),
            self.user.clone(),
            self.user_name.clone(),
            self.text.clone(),
            self.reply_count.to_string(),
        ]
    }
}

/// Flatten an archive: each message followed by its replies.
#[must_use]
pub fn message_rows(archive: &Archive) -> Vec<MessageRow> {
    let mut rows = Vec::with_capacity(archive.messages.len() + archive.reply_count());
    for msg in &archive.messages {
        rows.push(MessageRow::from_message(msg, None));
        for reply in &msg.thread_messages {
            rows.push(MessageRow::from_message(reply, Some(msg)));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArchiveMetadata, Channel};
    use chrono::Utc;

    #[test]
    fn test_replies_follow_parent() {
        let mut parent = Message::new("U1", "q", "10.000001").with_replies(1);
        parent
            .thread_messages
            .push(Message::new("U2", "a", "10.000002").in_thread("10.000001"));
        let archive = Archive::new(
            ArchiveMetadata::from_channel(&Channel::new("C1", "general"), Utc::now()),
            vec![parent, Message::new("U3", "later", "20.0")],
        );

        let rows = message_rows(&archive);
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].depth, rows[0].parent_ts.as_str()), (0, ""));
        assert_eq!((rows[1].depth, rows[1].parent_ts.as_str()), (1, "10.000001"));
        assert_eq!(rows[0].reply_count, 1);
        assert_eq!(rows[2].text, "later");
        assert_eq!(rows[2].timestamp, "1970-01-01T00:00:20.000000Z");
        assert_eq!(rows[1].fields().len(), COLUMNS.len());
    }
}
