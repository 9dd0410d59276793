//! Error types for slack-snatch.
//!
//! This module provides comprehensive error handling following the thiserror pattern.
//! Variants are grouped by how the archiver reacts to them: configuration and
//! authentication failures abort the run, lookup and permission failures skip
//! a single channel, and transient server failures are retried by the client
//! before they ever surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for slack-snatch operations.
#[derive(Error, Debug)]
pub enum SnatchError {
    /// No API token was supplied through any configuration source.
    #[error("Missing Slack token: pass --token or set SLACK_BOT_TOKEN")]
    MissingToken,

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid configuration file contents.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// A channel identifier or name did not match any visible channel.
    #[error("Channel not found: {channel}")]
    ChannelNotFound {
        /// The identifier or name that was requested.
        channel: String,
    },

    /// A channel name matched more than one channel.
    #[error("Channel name '{name}' is ambiguous; matches {}", .candidates.join(", "))]
    AmbiguousChannel {
        /// The name that was requested.
        name: String,
        /// IDs of every matching channel.
        candidates: Vec<String>,
    },

    /// The token is missing the scope or membership needed for a call.
    #[error("Permission denied calling {method}{}: {code}", channel_suffix(.channel.as_deref()))]
    PermissionDenied {
        /// API method that was rejected.
        method: String,
        /// Channel the call targeted, if any.
        channel: Option<String>,
        /// Slack error code (`missing_scope`, `not_in_channel`, ...).
        code: String,
    },

    /// The token itself was rejected.
    #[error("Authentication failed: {code}")]
    AuthFailed {
        /// Slack error code (`invalid_auth`, `token_revoked`, ...).
        code: String,
    },

    /// The API answered with `ok: false` for a reason not covered above.
    #[error("Slack API error calling {method}{}: {code}", channel_suffix(.channel.as_deref()))]
    ApiError {
        /// API method that failed.
        method: String,
        /// Channel the call targeted, if any.
        channel: Option<String>,
        /// Slack error code.
        code: String,
    },

    /// Retries were exhausted while the server kept rate limiting or failing.
    #[error("Gave up calling {method} after {attempts} attempts: {reason}")]
    RetriesExhausted {
        /// API method that failed.
        method: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last failure observed.
        reason: String,
    },

    /// Transport-level failure talking to the API.
    #[error("HTTP request to {method} failed")]
    HttpError {
        /// API method that failed.
        method: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Fetching one channel failed; wraps the cause with channel identity.
    #[error("Failed to archive #{channel} ({channel_id})")]
    ChannelFetchFailed {
        /// Channel name.
        channel: String,
        /// Channel identifier.
        channel_id: String,
        /// Underlying error.
        #[source]
        source: Box<SnatchError>,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A file exists but is not a valid archive artifact.
    #[error("Invalid archive file: {path}: {reason}")]
    InvalidArchive {
        /// Path to the invalid file.
        path: PathBuf,
        /// Reason why the file is invalid.
        reason: String,
    },

    /// Export error.
    #[error("Export failed: {message}")]
    ExportError {
        /// Human-readable error message.
        message: String,
        /// Underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },

    /// Unsupported operation or feature.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },

    /// Run stopped by Ctrl+C.
    #[error("Interrupted")]
    Interrupted,
}

fn channel_suffix(channel: Option<&str>) -> String {
    channel.map(|c| format!(" for {c}")).unwrap_or_default()
}

/// Slack error codes that mean the token lacks access to a resource.
const PERMISSION_CODES: &[&str] = &[
    "missing_scope",
    "not_in_channel",
    "access_denied",
    "no_permission",
    "restricted_action",
    "ekm_access_denied",
    "is_archived",
];

/// Slack error codes that mean the token is unusable.
const AUTH_CODES: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
    "no_such_token",
];

impl SnatchError {
    /// Classify an `ok: false` API response into the error taxonomy.
    #[must_use]
    pub fn api(method: impl Into<String>, channel: Option<&str>, code: impl Into<String>) -> Self {
        let method = method.into();
        let code = code.into();
        let channel = channel.map(str::to_string);

        if AUTH_CODES.contains(&code.as_str()) {
            Self::AuthFailed { code }
        } else if PERMISSION_CODES.contains(&code.as_str()) {
            Self::PermissionDenied {
                method,
                channel,
                code,
            }
        } else if code == "channel_not_found" {
            Self::ChannelNotFound {
                channel: channel.unwrap_or_default(),
            }
        } else {
            Self::ApiError {
                method,
                channel,
                code,
            }
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new serialization error with context.
    #[must_use]
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::SerializationError {
            context: context.into(),
            source,
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Wrap an error with the identity of the channel being archived.
    #[must_use]
    pub fn for_channel(self, channel: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self::ChannelFetchFailed {
            channel: channel.into(),
            channel_id: channel_id.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through channel wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::ChannelFetchFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.root() {
            Self::ChannelNotFound { .. }
            | Self::AmbiguousChannel { .. }
            | Self::FileNotFound { .. } => exit_codes::EXIT_NOT_FOUND,
            Self::PermissionDenied { .. } => exit_codes::EXIT_PERMISSION_DENIED,
            Self::MissingToken | Self::ConfigError { .. } | Self::InvalidConfig { .. } => {
                exit_codes::EXIT_CONFIG_ERROR
            }
            Self::ExportError { .. } => exit_codes::EXIT_EXPORT_ERROR,
            Self::InvalidArchive { .. } | Self::SerializationError { .. } => {
                exit_codes::EXIT_DATA_ERROR
            }
            Self::InvalidArgument { .. } => exit_codes::EXIT_USAGE_ERROR,
            Self::Interrupted => exit_codes::EXIT_INTERRUPTED,
            Self::IoError { .. } => exit_codes::EXIT_IO_ERROR,
            _ => exit_codes::EXIT_GENERAL_ERROR,
        }
    }

    /// Check if this error must abort a multi-channel run.
    ///
    /// Everything else is logged and the run moves on to the next channel.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root(),
            Self::MissingToken
                | Self::AuthFailed { .. }
                | Self::ConfigError { .. }
                | Self::InvalidConfig { .. }
                | Self::Interrupted
        )
    }
}

/// Result type alias for slack-snatch operations.
pub type Result<T> = std::result::Result<T, SnatchError>;

impl From<std::io::Error> for SnatchError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SnatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

impl From<std::string::FromUtf8Error> for SnatchError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::ExportError {
            message: format!("Invalid UTF-8: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// Channel or file not found.
    pub const EXIT_NOT_FOUND: i32 = 3;
    /// Token rejected or lacking scope.
    pub const EXIT_PERMISSION_DENIED: i32 = 4;
    /// Invalid or missing configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Export operation failed.
    pub const EXIT_EXPORT_ERROR: i32 = 6;
    /// Invalid command-line usage (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// Input data format error (BSD standard).
    pub const EXIT_DATA_ERROR: i32 = 65;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
    /// Terminated by Ctrl+C (128 + SIGINT).
    pub const EXIT_INTERRUPTED: i32 = 130;
}
