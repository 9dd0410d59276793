//! Slack Web API client.
//!
//! [`SlackApi`] is the seam the archiver is written against; [`SlackClient`]
//! is the reqwest-backed implementation. Every list endpoint is cursor
//! paginated and every request goes through the retry loop in [`retry`].

pub mod retry;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, SnatchError};
use crate::model::{Channel, Message};
use crate::util::mask_token;

pub use retry::RetryConfig;
use retry::{calculate_backoff, is_retryable_error, is_transient_status, parse_retry_after};

/// Production API endpoint.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api/";

/// Page size for `conversations.list` and `users.list`.
pub const LIST_PAGE_SIZE: u32 = 200;

/// Page size for `conversations.history` and `conversations.replies`.
pub const HISTORY_PAGE_SIZE: u32 = 100;

/// Operations the archiver needs from the chat platform.
///
/// Calls are awaited one at a time; implementations need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait SlackApi {
    /// All public and private channels visible to the token.
    async fn list_channels(&self, include_archived: bool) -> Result<Vec<Channel>>;

    /// Map of user ID to display name for every workspace member.
    async fn list_users(&self) -> Result<HashMap<String, String>>;

    /// Fresh metadata for one channel.
    async fn channel_info(&self, channel_id: &str) -> Result<Channel>;

    /// The channel's full history, pages concatenated in server order.
    async fn fetch_history(&self, channel_id: &str) -> Result<Vec<Message>>;

    /// Every message of one thread, as returned by the server (parent included).
    async fn fetch_thread(&self, channel_id: &str, parent_ts: &str) -> Result<Vec<Message>>;
}

/// Connection settings for [`SlackClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Bot or user token.
    pub token: String,
    /// Base URL that method names are joined onto.
    pub api_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Pause between consecutive pages of one listing.
    pub page_delay: Duration,
    /// Retry policy.
    pub retry: RetryConfig,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &mask_token(&self.token))
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("page_delay", &self.page_delay)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientConfig {
    /// Default settings for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            page_delay: Duration::from_millis(500),
            retry: RetryConfig::default(),
        }
    }

    /// Builder: point at another endpoint.
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Builder: set the pause between pages.
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Builder: set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builder: set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed Slack client.
pub struct SlackClient {
    http: reqwest::Client,
    base: Url,
    token: String,
    page_delay: Duration,
    retry: RetryConfig,
}

impl fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackClient")
            .field("base", &self.base.as_str())
            .field("token", &mask_token(&self.token))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

/// A `users.list` member.
#[derive(Debug, Deserialize)]
struct Member {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: Option<String>,
}

impl Member {
    fn display_name(&self) -> &str {
        match self.real_name.as_deref() {
            Some(real) if !real.is_empty() => real,
            _ if !self.name.is_empty() => &self.name,
            _ => "Unknown",
        }
    }
}

impl SlackClient {
    /// Build a client from connection settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(SnatchError::MissingToken);
        }

        let mut base = config.api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| SnatchError::InvalidConfig {
            message: format!("Invalid API base URL '{}': {e}", config.api_base),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SnatchError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            token: config.token,
            page_delay: config.page_delay,
            retry: config.retry,
        })
    }

    /// Call one API method and return the body of a successful (`ok: true`) response.
    async fn call(
        &self,
        method: &str,
        channel: Option<&str>,
        params: &[(&str, String)],
    ) -> Result<Value> {
        let url = self.base.join(method).map_err(|e| SnatchError::InvalidConfig {
            message: format!("Cannot build URL for {method}: {e}"),
        })?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let can_retry = attempt <= self.retry.max_retries;

            let sent = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .query(params)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) if can_retry && is_retryable_error(&e) => {
                    let delay = calculate_backoff(attempt - 1, &self.retry);
                    warn!(
                        method,
                        channel,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(send_failure(method, attempt, e)),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = parse_retry_after(response.headers())
                    .unwrap_or(self.retry.default_retry_after);
                if !can_retry {
                    return Err(SnatchError::RetriesExhausted {
                        method: method.to_string(),
                        attempts: attempt,
                        reason: "rate limited".to_string(),
                    });
                }
                warn!(
                    method,
                    channel,
                    retry_after_ms = delay.as_millis() as u64,
                    "Rate limited; waiting before retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if is_transient_status(status) {
                if !can_retry {
                    return Err(SnatchError::RetriesExhausted {
                        method: method.to_string(),
                        attempts: attempt,
                        reason: format!("HTTP {status}"),
                    });
                }
                let delay = calculate_backoff(attempt - 1, &self.retry);
                warn!(
                    method,
                    channel,
                    status = status.as_u16(),
                    delay_ms = delay.as_millis() as u64,
                    "Server error; retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                return Err(SnatchError::api(
                    method,
                    channel,
                    format!("http_{}", status.as_u16()),
                ));
            }

            let body = response.bytes().await.map_err(|e| SnatchError::HttpError {
                method: method.to_string(),
                source: e,
            })?;
            let value: Value = serde_json::from_slice(&body).map_err(|e| {
                SnatchError::serialization(format!("Invalid JSON in {method} response"), e)
            })?;

            if value.get("ok").and_then(Value::as_bool) == Some(true) {
                return Ok(value);
            }

            let code = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");

            if code == "ratelimited" && can_retry {
                let delay = self.retry.default_retry_after;
                warn!(
                    method,
                    channel,
                    retry_after_ms = delay.as_millis() as u64,
                    "Rate limited; waiting before retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(SnatchError::api(method, channel, code));
        }
    }

    /// Follow `next_cursor` until exhausted, collecting the array under `items_key`.
    async fn paginate<T: DeserializeOwned>(
        &self,
        method: &str,
        channel: Option<&str>,
        params: &[(&str, String)],
        items_key: &str,
        limit: u32,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page: u32 = 0;

        loop {
            if page > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
            page += 1;

            let mut query: Vec<(&str, String)> = params.to_vec();
            query.push(("limit", limit.to_string()));
            if let Some(cursor) = &cursor {
                query.push(("cursor", cursor.clone()));
            }

            let mut value = self.call(method, channel, &query).await?;

            let batch: Vec<T> = match value.get_mut(items_key).map(Value::take) {
                Some(raw) => serde_json::from_value(raw).map_err(|e| {
                    SnatchError::serialization(
                        format!("Unexpected '{items_key}' shape in {method} response"),
                        e,
                    )
                })?,
                None => Vec::new(),
            };

            let metadata: ResponseMetadata = value
                .get_mut("response_metadata")
                .map(Value::take)
                .and_then(|raw| serde_json::from_value(raw).ok())
                .unwrap_or_default();

            debug!(
                method,
                channel,
                page,
                count = batch.len(),
                cursor = cursor.as_deref().unwrap_or(""),
                "Fetched page"
            );
            items.extend(batch);

            if metadata.next_cursor.is_empty() {
                break;
            }
            cursor = Some(metadata.next_cursor);
        }

        Ok(items)
    }
}

impl SlackApi for SlackClient {
    async fn list_channels(&self, include_archived: bool) -> Result<Vec<Channel>> {
        let params = [
            ("types", "public_channel,private_channel".to_string()),
            ("exclude_archived", (!include_archived).to_string()),
        ];
        let channels: Vec<Channel> = self
            .paginate("conversations.list", None, &params, "channels", LIST_PAGE_SIZE)
            .await?;
        debug!(count = channels.len(), include_archived, "Listed channels");
        Ok(channels)
    }

    async fn list_users(&self) -> Result<HashMap<String, String>> {
        let members: Vec<Member> = self
            .paginate("users.list", None, &[], "members", LIST_PAGE_SIZE)
            .await?;
        Ok(members
            .iter()
            .map(|m| (m.id.clone(), m.display_name().to_string()))
            .collect())
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Channel> {
        let params = [
            ("channel", channel_id.to_string()),
            ("include_num_members", "true".to_string()),
        ];
        let mut value = self
            .call("conversations.info", Some(channel_id), &params)
            .await?;
        let raw = value
            .get_mut("channel")
            .map(Value::take)
            .ok_or_else(|| SnatchError::api("conversations.info", Some(channel_id), "missing_channel"))?;
        serde_json::from_value(raw).map_err(|e| {
            SnatchError::serialization("Unexpected channel shape in conversations.info response", e)
        })
    }

    async fn fetch_history(&self, channel_id: &str) -> Result<Vec<Message>> {
        let params = [("channel", channel_id.to_string())];
        self.paginate(
            "conversations.history",
            Some(channel_id),
            &params,
            "messages",
            HISTORY_PAGE_SIZE,
        )
        .await
    }

    async fn fetch_thread(&self, channel_id: &str, parent_ts: &str) -> Result<Vec<Message>> {
        let params = [
            ("channel", channel_id.to_string()),
            ("ts", parent_ts.to_string()),
        ];
        self.paginate(
            "conversations.replies",
            Some(channel_id),
            &params,
            "messages",
            HISTORY_PAGE_SIZE,
        )
        .await
    }
}

/// Map a transport error that will not be retried.
///
/// Only a retryable failure on a later attempt counts as running out of
/// retries; anything else is reported as the HTTP error it is.
fn send_failure(method: &str, attempt: u32, error: reqwest::Error) -> SnatchError {
    if attempt > 1 && is_retryable_error(&error) {
        SnatchError::RetriesExhausted {
            method: method.to_string(),
            attempts: attempt,
            reason: error.to_string(),
        }
    } else {
        SnatchError::HttpError {
            method: method.to_string(),
            source: error,
        }
    }
}
