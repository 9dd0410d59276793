//! Command-line interface for slack-snatch.
//!
//! Provides scriptable access to the archiver and the artifact tools:
//! - `list`: List channels visible to the token
//! - `archive`: Fetch channels and write JSON artifacts
//! - `index`: Rebuild `INDEX.json` for the archive directory
//! - `stats`: Summarize one artifact or the whole directory
//! - `search`: Find messages in an artifact
//! - `convert`: Render an artifact as HTML, Markdown, text or CSV

mod commands;

pub use commands::*;

use std::future::Future;
use std::io;
use std::path::PathBuf;

use clap::{ArgGroup, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use crate::archiver::ArchiverConfig;
use crate::config::Config;
use crate::error::{Result, SnatchError};

/// Archive Slack conversations to JSON and render them for reading.
#[derive(Debug, Parser)]
#[command(name = "slack-snatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Slack bot token (xoxb-...).
    #[arg(long, global = true, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory holding archive artifacts (default: ./archives).
    #[arg(long, global = true, env = "SNATCH_ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Output format for structured data.
    #[arg(short = 'o', long, global = true, default_value = "text", env = "SNATCH_OUTPUT")]
    pub output: OutputFormat,

    /// Enable verbose output (debug logging).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "SNATCH_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "SNATCH_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "SNATCH_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log level options, ordered from least to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Cli {
    /// Log level after `-v` / `-q` are applied.
    #[must_use]
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            self.log_level.max(LogLevel::Debug)
        } else if self.quiet {
            LogLevel::Error
        } else {
            self.log_level
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List channels visible to the token.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Archive one, several or all channels.
    Archive(ArchiveArgs),

    /// Rebuild INDEX.json for the archive directory.
    Index,

    /// Show statistics for an artifact or the archive directory.
    Stats(StatsArgs),

    /// Search messages in an artifact.
    #[command(alias = "find")]
    Search(SearchArgs),

    /// Render an artifact as HTML, Markdown, text or CSV.
    Convert(ConvertArgs),

    /// View or initialize configuration.
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for shell completions.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and write them to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "slack-snatch", &mut io::stdout());
}

/// Output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: ChannelFilterArgs,
}

/// Channel filters shared by `list` and `archive`.
///
/// Each flag has a `--no-` twin so a command line can switch off a filter
/// the config file turns on. The last one given wins.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ChannelFilterArgs {
    /// Include archived channels.
    #[arg(long, overrides_with = "no_include_archived")]
    include_archived: bool,

    /// Leave archived channels out, even if the config includes them.
    #[arg(long, overrides_with = "include_archived")]
    no_include_archived: bool,

    /// Only channels the bot is a member of (with --all).
    #[arg(long, overrides_with = "no_member_only")]
    member_only: bool,

    /// List every visible channel, even if the config restricts to members.
    #[arg(long, overrides_with = "member_only")]
    no_member_only: bool,
}

impl ChannelFilterArgs {
    /// Explicit `--include-archived` choice, if any.
    #[must_use]
    pub fn include_archived(&self) -> Option<bool> {
        flag_pair(self.include_archived, self.no_include_archived)
    }

    /// Explicit `--member-only` choice, if any.
    #[must_use]
    pub fn member_only(&self) -> Option<bool> {
        flag_pair(self.member_only, self.no_member_only)
    }

    /// Overlay the explicit choices onto a configured archiver.
    pub fn apply(&self, config: &mut ArchiverConfig) {
        if let Some(v) = self.include_archived() {
            config.include_archived = v;
        }
        if let Some(v) = self.member_only() {
            config.member_only = v;
        }
    }
}

/// Resolve a `--x`/`--no-x` pair; `None` when neither was given.
fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Arguments for the archive command.
#[derive(Debug, Parser)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["all", "channel", "channels"]),
))]
pub struct ArchiveArgs {
    /// Archive every eligible channel.
    #[arg(long)]
    pub all: bool,

    /// Archive a single channel by ID or name.
    #[arg(long, value_name = "ID|NAME")]
    pub channel: Option<String>,

    /// Archive several channels by ID or name.
    #[arg(long, value_name = "ID|NAME", num_args = 1.., value_delimiter = ',')]
    pub channels: Vec<String>,

    /// Fetch thread replies, even if the config turns them off.
    #[arg(long, overrides_with = "no_threads")]
    threads: bool,

    /// Skip fetching thread replies.
    #[arg(long, overrides_with = "threads")]
    no_threads: bool,

    #[command(flatten)]
    pub filter: ChannelFilterArgs,

    /// Rebuild INDEX.json after archiving.
    #[arg(long)]
    pub index: bool,
}

impl ArchiveArgs {
    /// Explicit thread choice, if any.
    #[must_use]
    pub fn threads(&self) -> Option<bool> {
        flag_pair(self.threads, self.no_threads)
    }

    /// The explicitly named channels, if any.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.channel
            .iter()
            .chain(self.channels.iter())
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect()
    }
}

/// Arguments for the stats command.
#[derive(Debug, Parser)]
pub struct StatsArgs {
    /// Artifact to summarize (default: the whole archive directory).
    pub artifact: Option<PathBuf>,

    /// Include a per-day message breakdown.
    #[arg(long)]
    pub by_day: bool,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
#[command(group(
    ArgGroup::new("query")
        .required(true)
        .args(["keyword", "user"]),
))]
pub struct SearchArgs {
    /// Artifact to search.
    pub artifact: PathBuf,

    /// Substring to look for in message text.
    pub keyword: Option<String>,

    /// Match case exactly.
    #[arg(short = 'c', long, requires = "keyword")]
    pub case_sensitive: bool,

    /// Find messages by author name instead.
    #[arg(short = 'u', long, value_name = "NAME")]
    pub user: Option<String>,
}

/// Arguments for the convert command.
#[derive(Debug, Parser)]
pub struct ConvertArgs {
    /// Artifact to convert.
    pub artifact: PathBuf,

    /// Output format: html, markdown, text, csv or all.
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// Output base path; the format extension is appended.
    #[arg(short = 'O', long = "out", value_name = "BASE")]
    pub out: Option<PathBuf>,

    /// Leave thread replies out.
    #[arg(long)]
    pub no_threads: bool,

    /// Leave join/leave notices out.
    #[arg(long)]
    pub no_system: bool,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Config action.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (token masked).
    Show,
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show the configuration file path.
    Path,
}

/// Initialize the logging system based on CLI options.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.effective_log_level().to_filter_string()));

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Drive a future to completion on a single-threaded runtime.
///
/// Every request is awaited before the next is issued, so one thread is all
/// the archiver ever needs. Ctrl+C drops the future and yields
/// [`SnatchError::Interrupted`]; artifacts already written stay on disk.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SnatchError::io("Failed to start async runtime", e))?;
    runtime.block_on(until_interrupted(future, tokio::signal::ctrl_c()))
}

/// Race `future` against `signal`.
///
/// A signal listener that fails to install is logged and ignored.
async fn until_interrupted<F, S>(future: F, signal: S) -> Result<F::Output>
where
    F: Future,
    S: Future<Output = io::Result<()>>,
{
    tokio::pin!(future);
    let received = tokio::select! {
        biased;
        output = &mut future => return Ok(output),
        received = signal => received,
    };
    match received {
        Ok(()) => {
            tracing::warn!("Interrupted; stopping");
            Err(SnatchError::Interrupted)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
            Ok(future.await)
        }
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    // `config init` and `config path` must work before any file exists.
    let config = match &cli.command {
        Commands::Config(ConfigArgs {
            action: ConfigAction::Init { .. } | ConfigAction::Path,
        }) => Config::default(),
        _ => Config::load_or_default(cli.config.as_deref())?,
    };

    match &cli.command {
        Commands::List(args) => commands::list::run(&cli, &config, args),
        Commands::Archive(args) => commands::archive::run(&cli, &config, args),
        Commands::Index => commands::index::run(&cli, &config),
        Commands::Stats(args) => commands::stats::run(&cli, &config, args),
        Commands::Search(args) => commands::search::run(&cli, args),
        Commands::Convert(args) => commands::convert::run(&cli, &config, args),
        Commands::Config(args) => commands::config::run(&cli, &config, args),
        Commands::Completions(args) => {
            generate_completions(args.shell);
            Ok(())
        }
    }
}
