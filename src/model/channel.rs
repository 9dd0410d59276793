//! Channel metadata as returned by `conversations.list` / `conversations.info`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownFields;

/// A topic or purpose block: Slack nests the text under `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelText {
    /// The text itself.
    #[serde(default)]
    pub value: String,
}

/// A public or private channel visible to the token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel identifier (`C…` or `G…`).
    pub id: String,
    /// Channel name without the leading `#`.
    #[serde(default)]
    pub name: String,
    /// Current topic.
    #[serde(default)]
    pub topic: ChannelText,
    /// Stated purpose.
    #[serde(default)]
    pub purpose: ChannelText,
    /// Whether the channel is private.
    #[serde(default)]
    pub is_private: bool,
    /// Whether the channel has been archived.
    #[serde(default)]
    pub is_archived: bool,
    /// Whether the bot is a member.
    #[serde(default)]
    pub is_member: bool,
    /// Creation time in unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    /// Member count, when the API reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_members: Option<u64>,
    /// Unknown fields for forward compatibility.
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl Channel {
    /// Build a bare channel; mostly useful in tests.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Topic text (empty if unset).
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic.value
    }

    /// Purpose text (empty if unset).
    #[must_use]
    pub fn purpose(&self) -> &str {
        &self.purpose.value
    }

    /// Creation time as a UTC timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Whether `query` is this channel's name (a leading `#` is ignored).
    #[must_use]
    pub fn matches_name(&self, query: &str) -> bool {
        self.name == query.trim_start_matches('#')
    }
}
