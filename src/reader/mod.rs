//! Reading artifacts back: loading, statistics, search and directory listing.

pub mod stats;
pub mod table;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SnatchError};
use crate::model::{Archive, IndexEntry, Message, INDEX_FILENAME};
use crate::util::mebibytes;

pub use stats::{ArchiveStats, AuthorCount, TOP_AUTHOR_LIMIT};
pub use table::{message_rows, MessageRow, COLUMNS};

/// Load and validate an artifact.
pub fn load_archive(path: impl AsRef<Path>) -> Result<Archive> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SnatchError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path)
        .map_err(|e| SnatchError::io(format!("Failed to read {}", path.display()), e))?;
    let archive: Archive =
        serde_json::from_slice(&bytes).map_err(|e| SnatchError::InvalidArchive {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !archive.is_consistent() {
        warn!(
            path = %path.display(),
            message_count = archive.message_count,
            actual = archive.messages.len(),
            "Artifact message_count does not match its messages"
        );
    }

    Ok(archive)
}

/// A search hit: the matching message and, for replies, its parent's `ts`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    /// Parent timestamp when the hit is a thread reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ts: Option<&'a str>,
    /// The matching message.
    pub message: &'a Message,
}

fn search_with<'a>(
    archive: &'a Archive,
    mut matches: impl FnMut(&Message) -> bool,
) -> Vec<SearchHit<'a>> {
    let mut hits = Vec::new();
    for msg in &archive.messages {
        if matches(msg) {
            hits.push(SearchHit {
                parent_ts: None,
                message: msg,
            });
        }
        for reply in &msg.thread_messages {
            if matches(reply) {
                hits.push(SearchHit {
                    parent_ts: Some(&msg.ts),
                    message: reply,
                });
            }
        }
    }
    hits
}

/// Messages and replies whose text contains `keyword`.
#[must_use]
pub fn search_messages<'a>(
    archive: &'a Archive,
    keyword: &str,
    case_sensitive: bool,
) -> Vec<SearchHit<'a>> {
    if case_sensitive {
        search_with(archive, |m| m.text.contains(keyword))
    } else {
        let needle = keyword.to_lowercase();
        search_with(archive, |m| m.text.to_lowercase().contains(&needle))
    }
}

/// Messages and replies written by `user_name` (exact match on the resolved name).
#[must_use]
pub fn search_by_user<'a>(archive: &'a Archive, user_name: &str) -> Vec<SearchHit<'a>> {
    search_with(archive, |m| m.author() == user_name)
}

/// Artifact files in `dir`, sorted by file name. `INDEX.json` is skipped.
pub fn archive_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SnatchError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json && entry.file_name() != INDEX_FILENAME {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Summaries of every readable artifact in `dir`, in file name order.
///
/// Files that fail to parse are logged and left out.
pub fn list_archives(dir: impl AsRef<Path>) -> Result<Vec<IndexEntry>> {
    let mut entries = Vec::new();
    for path in archive_files(dir)? {
        match load_archive(&path) {
            Ok(archive) => entries.push(IndexEntry::from_archive(&path, &archive)),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable artifact"),
        }
    }
    debug!(count = entries.len(), "Listed artifacts");
    Ok(entries)
}

/// Totals across the archive directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryStats {
    /// Directory that was scanned.
    pub directory: PathBuf,
    /// Readable artifacts.
    pub total_archives: usize,
    /// Top-level messages across all artifacts.
    pub total_messages: usize,
    /// Combined artifact size in bytes.
    pub total_bytes: u64,
    /// Combined size in MiB, two decimals.
    pub total_size_mb: f64,
    /// Top-level messages per channel name.
    pub channels: IndexMap<String, usize>,
}

/// Summarize every artifact in `dir`.
pub fn archive_stats(dir: impl AsRef<Path>) -> Result<DirectoryStats> {
    let dir = dir.as_ref();
    let mut stats = DirectoryStats {
        directory: dir.to_path_buf(),
        total_archives: 0,
        total_messages: 0,
        total_bytes: 0,
        total_size_mb: 0.0,
        channels: IndexMap::new(),
    };

    for path in archive_files(dir)? {
        let archive = match load_archive(&path) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable artifact");
                continue;
            }
        };
        stats.total_bytes += std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        stats.total_archives += 1;
        stats.total_messages += archive.message_count;
        *stats
            .channels
            .entry(archive.metadata.channel_name.clone())
            .or_insert(0) += archive.message_count;
    }

    stats.total_size_mb = mebibytes(stats.total_bytes);
    Ok(stats)
}
