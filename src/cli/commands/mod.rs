//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod archive;
pub mod config;
pub mod convert;
pub mod index;
pub mod list;
pub mod search;
pub mod stats;

use crate::cli::Cli;
use crate::client::SlackClient;
use crate::config::Config;
use crate::error::Result;

/// Build an API client from the token in CLI args, environment or config.
///
/// Fails with a configuration error before any network call when no token
/// is available.
pub fn slack_client(cli: &Cli, config: &Config) -> Result<SlackClient> {
    let token = config.resolve_token(cli.token.as_deref())?;
    SlackClient::new(config.client_config(token))
}
