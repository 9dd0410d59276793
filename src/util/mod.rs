//! Utility functions for common operations.
//!
//! - Atomic file operations, so a crash never leaves a half-written artifact
//! - File name sanitizing for channel names
//! - Token masking for logs and `config show`

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, SnatchError};

/// Create a temp file next to `path`, creating the parent directory if needed.
fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => {
            return Err(SnatchError::IoError {
                context: format!("Cannot determine parent directory for: {}", path.display()),
                source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
            })
        }
    };

    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| {
            SnatchError::io(format!("Failed to create directory: {}", parent.display()), e)
        })?;
    }

    // Same directory keeps the final rename on one filesystem.
    NamedTempFile::new_in(parent).map_err(|e| {
        SnatchError::io(
            format!("Failed to create temporary file in: {}", parent.display()),
            e,
        )
    })
}

/// Atomically write content to a file.
///
/// The bytes go to a temporary file in the target's directory, which is then
/// renamed over the target. If any step fails the target is left untouched.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the temporary file
/// cannot be written, or the final rename fails.
///
/// # Example
///
/// ```rust,no_run
/// use slack_snatch::util::atomic_write;
///
/// atomic_write("archives/INDEX.json", b"{}").unwrap();
/// ```
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let mut atomic = AtomicFile::create(path)?;
    let target = atomic.target_path.display().to_string();
    atomic
        .writer()
        .write_all(content)
        .map_err(|e| SnatchError::io(format!("Failed to write to temporary file for: {target}"), e))?;
    atomic.finish()
}

/// A file that replaces its target only when [`finish`](Self::finish) is called.
///
/// Dropping it without finishing discards the temporary file.
///
/// ```rust,no_run
/// use slack_snatch::util::AtomicFile;
/// use std::io::Write;
///
/// let mut atomic = AtomicFile::create("general.md").unwrap();
/// writeln!(atomic.writer(), "# #general").unwrap();
/// atomic.finish().unwrap();
/// ```
pub struct AtomicFile {
    temp_file: NamedTempFile,
    target_path: PathBuf,
}

impl AtomicFile {
    /// Create a new atomic file writer for the given target path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            temp_file: temp_file_beside(path)?,
            target_path: path.to_path_buf(),
        })
    }

    /// Get a mutable reference to the underlying writer.
    pub fn writer(&mut self) -> &mut NamedTempFile {
        &mut self.temp_file
    }

    /// Flush and rename the temp file over the target.
    pub fn finish(mut self) -> Result<()> {
        self.temp_file.flush().map_err(|e| {
            SnatchError::io(
                format!("Failed to flush file: {}", self.target_path.display()),
                e,
            )
        })?;

        self.temp_file.persist(&self.target_path).map_err(|e| {
            SnatchError::io(
                format!("Failed to atomically write: {}", self.target_path.display()),
                e.error,
            )
        })?;

        Ok(())
    }
}

/// Make a channel name safe to use as a file name component.
///
/// Path separators become `-`; an empty result becomes `unnamed`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Mask a token for display, keeping its type prefix and last four characters.
#[must_use]
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "(unset)".to_string();
    }
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let prefix: String = chars[..5].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}…{suffix}")
}

/// Size in mebibytes, rounded to two decimals.
#[must_use]
pub fn mebibytes(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
