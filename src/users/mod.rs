//! User ID to display name lookup, loaded once per run.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::client::SlackApi;
use crate::error::Result;

/// Cached user directory.
#[derive(Debug, Clone, Default)]
pub struct UserCache {
    names: HashMap<String, String>,
}

impl UserCache {
    /// Load every workspace member from the API.
    ///
    /// Authentication failures propagate. Any other failure (typically a
    /// missing `users:read` scope) is logged and yields an empty cache, so
    /// messages fall back to raw user IDs.
    pub async fn load<C: SlackApi>(api: &C) -> Result<Self> {
        match api.list_users().await {
            Ok(names) => {
                debug!(count = names.len(), "Loaded user directory");
                Ok(Self { names })
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(error = %e, "Could not load users; falling back to raw user IDs");
                Ok(Self::default())
            }
        }
    }

    /// Build a cache from an existing map.
    #[must_use]
    pub fn from_map(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Display name for `user_id`, or the ID itself when unknown.
    #[must_use]
    pub fn resolve<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.names.get(user_id).map_or(user_id, String::as_str)
    }

    /// Display name for `user_id`, if known.
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<&str> {
        self.names.get(user_id).map(String::as_str)
    }

    /// Number of cached users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
