//! Messages and thread replies.
//!
//! A top-level message and a thread reply share one record type. Replies
//! carry a `thread_ts` pointing at their parent and never have nested
//! `thread_messages` of their own.

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownFields;

/// Subtypes rendered as system notices rather than conversation.
pub const SYSTEM_SUBTYPES: &[&str] = &["channel_join", "channel_leave", "bot_add"];

/// A single message, as fetched from the API and as stored in an artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author user ID. Bot and some system messages have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Resolved display name of the author (added during archiving).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Message subtype (`channel_join`, `bot_message`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Body in Slack mrkdwn.
    #[serde(default)]
    pub text: String,

    /// Server timestamp: unix seconds with a microsecond fraction, as a string.
    pub ts: String,

    /// Human-readable form of `ts` (added during archiving).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_readable: Option<String>,

    /// Parent timestamp. Equal to `ts` on a thread parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,

    /// Number of replies in the thread this message starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u32>,

    /// Replies attached during archiving, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thread_messages: Vec<Message>,

    /// Unknown fields for forward compatibility.
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl Message {
    /// Create a plain message.
    pub fn new(user: impl Into<String>, text: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            text: text.into(),
            ts: ts.into(),
            ..Self::default()
        }
    }

    /// Builder: mark as the parent of a thread with `count` replies.
    #[must_use]
    pub fn with_replies(mut self, count: u32) -> Self {
        self.reply_count = Some(count);
        self.thread_ts = Some(self.ts.clone());
        self
    }

    /// Builder: mark as a reply to `parent_ts`.
    #[must_use]
    pub fn in_thread(mut self, parent_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(parent_ts.into());
        self
    }

    /// Builder: set the subtype.
    #[must_use]
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Whether this message starts a thread with at least one reply.
    #[must_use]
    pub fn has_thread(&self) -> bool {
        self.reply_count.unwrap_or(0) > 0
    }

    /// Whether this message is a reply inside someone else's thread.
    #[must_use]
    pub fn is_thread_reply(&self) -> bool {
        self.thread_ts.as_deref().is_some_and(|parent| parent != self.ts)
    }

    /// Whether this is a join/leave style notice.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.subtype
            .as_deref()
            .is_some_and(|s| SYSTEM_SUBTYPES.contains(&s))
    }

    /// Name to show for the author: resolved name, raw ID, bot username, or "Unknown".
    #[must_use]
    pub fn author(&self) -> &str {
        self.user_name
            .as_deref()
            .or(self.user.as_deref())
            .or_else(|| self.extra.get("username").and_then(|v| v.as_str()))
            .unwrap_or("Unknown")
    }

    /// Parsed send time.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_ts(&self.ts)
    }

    /// Display form of the send time, falling back to the raw value.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .or_else(|| self.timestamp_readable.clone())
            .unwrap_or_else(|| self.ts.clone())
    }

    /// Total number of records: this message plus attached replies.
    #[must_use]
    pub fn record_count(&self) -> usize {
        1 + self.thread_messages.len()
    }
}

/// Split a Slack `ts` into (seconds, microseconds).
#[must_use]
pub fn ts_parts(ts: &str) -> Option<(i64, u32)> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    let secs = secs.parse::<i64>().ok()?;
    if frac.is_empty() {
        return Some((secs, 0));
    }
    if frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Right-pad so "1.5" reads as 500000 microseconds.
    let micros = format!("{frac:0<6}").parse::<u32>().ok()?;
    Some((secs, micros))
}

/// Parse a Slack `ts` into a UTC timestamp.
#[must_use]
pub fn parse_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, micros) = ts_parts(ts)?;
    DateTime::from_timestamp(secs, micros * 1_000)
}

/// RFC 3339 rendering of a Slack `ts`, used for `timestamp_readable`.
#[must_use]
pub fn readable_ts(ts: &str) -> Option<String> {
    parse_ts(ts).map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Order two Slack timestamps numerically; unparseable values sort first.
#[must_use]
pub fn compare_ts(a: &str, b: &str) -> Ordering {
    ts_parts(a).cmp(&ts_parts(b))
}
