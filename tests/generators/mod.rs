//! Synthetic Slack workspace for archiver tests.
//!
//! [`FakeSlack`] implements [`SlackApi`] from in-memory data and records
//! every call, so tests can assert both on what was written and on how many
//! requests it took.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use slack_snatch::client::SlackApi;
use slack_snatch::model::{Channel, Message};
use slack_snatch::{Result, SnatchError};

/// Start time pinned for every generated run.
pub fn run_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// The file stamp matching [`run_start`].
pub const RUN_STAMP: &str = "20240301_090000";

/// In-memory Slack workspace.
#[derive(Debug, Default)]
pub struct FakeSlack {
    /// Channels returned by `conversations.list`.
    pub channels: Vec<Channel>,
    /// User directory.
    pub users: HashMap<String, String>,
    /// Error code returned by `users.list`, if any.
    pub users_error: Option<String>,
    /// History per channel ID, in server order (newest first).
    pub history: HashMap<String, Vec<Message>>,
    /// Thread contents per (channel ID, parent ts), parent echoed first.
    pub threads: HashMap<(String, String), Vec<Message>>,
    /// Error code returned by `conversations.history` per channel ID.
    pub history_errors: HashMap<String, String>,
    /// Every call made, as `method:channel[:ts]`.
    pub calls: RefCell<Vec<String>>,
}

impl FakeSlack {
    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    /// Number of calls to one API method.
    pub fn count(&self, method: &str) -> usize {
        let prefix = format!("{method}:");
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    /// Number of `conversations.replies` calls.
    pub fn thread_calls(&self) -> usize {
        self.count("conversations.replies")
    }

    /// Add a channel with its history (given oldest first; stored newest first).
    pub fn with_channel(mut self, channel: Channel, mut messages: Vec<Message>) -> Self {
        messages.reverse();
        self.history.insert(channel.id.clone(), messages);
        self.channels.push(channel);
        self
    }

    /// Add a thread: the parent echo followed by `replies` in the given order.
    pub fn with_thread(mut self, channel_id: &str, parent: &Message, replies: Vec<Message>) -> Self {
        let mut thread = vec![parent.clone()];
        thread.extend(replies);
        self.threads
            .insert((channel_id.to_string(), parent.ts.clone()), thread);
        self
    }

    /// Make `conversations.history` fail for a channel.
    pub fn failing_history(mut self, channel_id: &str, code: &str) -> Self {
        self.history_errors
            .insert(channel_id.to_string(), code.to_string());
        self
    }
}

impl SlackApi for FakeSlack {
    async fn list_channels(&self, include_archived: bool) -> Result<Vec<Channel>> {
        self.record(format!("conversations.list:{include_archived}"));
        Ok(self
            .channels
            .iter()
            .filter(|c| include_archived || !c.is_archived)
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> Result<HashMap<String, String>> {
        self.record("users.list:".to_string());
        match &self.users_error {
            Some(code) => Err(SnatchError::api("users.list", None, code.as_str())),
            None => Ok(self.users.clone()),
        }
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Channel> {
        self.record(format!("conversations.info:{channel_id}"));
        self.channels
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| SnatchError::api("conversations.info", Some(channel_id), "channel_not_found"))
    }

    async fn fetch_history(&self, channel_id: &str) -> Result<Vec<Message>> {
        self.record(format!("conversations.history:{channel_id}"));
        if let Some(code) = self.history_errors.get(channel_id) {
            return Err(SnatchError::api(
                "conversations.history",
                Some(channel_id),
                code.as_str(),
            ));
        }
        Ok(self.history.get(channel_id).cloned().unwrap_or_default())
    }

    async fn fetch_thread(&self, channel_id: &str, parent_ts: &str) -> Result<Vec<Message>> {
        self.record(format!("conversations.replies:{channel_id}:{parent_ts}"));
        self.threads
            .get(&(channel_id.to_string(), parent_ts.to_string()))
            .cloned()
            .ok_or_else(|| {
                SnatchError::api("conversations.replies", Some(channel_id), "thread_not_found")
            })
    }
}

/// A member channel.
pub fn channel(id: &str, name: &str) -> Channel {
    let mut c = Channel::new(id, name);
    c.is_member = true;
    c.num_members = Some(4);
    c
}

/// A reply in the thread started at `parent_ts`.
pub fn reply(user: &str, text: &str, ts: &str, parent_ts: &str) -> Message {
    Message::new(user, text, ts).in_thread(parent_ts)
}

/// The reference workspace:
///
/// - `#general` (`C0GENERAL1`): 3 messages, the first with 2 replies whose
///   thread comes back out of order
/// - `#random` (`C0RANDOM01`): 1 message
/// - `#old-stuff` (`C0OLDSTUF1`): archived, 1 message
/// - `#secret` (`G0SECRET01`): private, history denied with `not_in_channel`
pub fn workspace() -> FakeSlack {
    let first = Message::new("U1", "Morning all, standup in 5?", "1709283600.000100").with_replies(2);
    let second = Message::new("U2", "Deploy went out <https://ci.example.com/42|build 42>", "1709284200.000200");
    let third = Message::new("U3", "Lunch?", "1709290800.000300");

    let mut old = channel("C0OLDSTUF1", "old-stuff");
    old.is_archived = true;
    let mut secret = channel("G0SECRET01", "secret");
    secret.is_private = true;
    secret.is_member = false;

    let mut slack = FakeSlack::default()
        .with_channel(
            channel("C0GENERAL1", "general"),
            vec![first.clone(), second, third],
        )
        .with_thread(
            "C0GENERAL1",
            &first,
            vec![
                reply("U1", "Make it 10", "1709283900.000100", &first.ts),
                reply("U2", "Sure", "1709283700.000100", &first.ts),
            ],
        )
        .with_channel(
            channel("C0RANDOM01", "random"),
            vec![Message::new("U2", "cat pictures", "1709280000.000001")],
        )
        .with_channel(old, vec![Message::new("U1", "old news", "1600000000.000001")])
        .with_channel(secret, Vec::new())
        .failing_history("G0SECRET01", "not_in_channel");

    slack.users = HashMap::from([
        ("U1".to_string(), "Alice".to_string()),
        ("U2".to_string(), "Bob".to_string()),
        ("U3".to_string(), "Carol".to_string()),
    ]);
    slack
}
