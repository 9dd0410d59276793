//! Rendering artifacts into readable formats.
//!
//! This module provides four export formats:
//! - HTML: standalone page with inline styles
//! - Markdown: headings, blockquoted thread replies
//! - Plain text: chat log with tree glyphs for replies
//! - CSV: one row per message or reply
//!
//! Every exporter makes a single pass over the message list and writes to
//! any `Write`, so the same code serves files and in-memory buffers.

mod csv;
mod html;
pub mod markup;
mod markdown;
mod text;

pub use csv::*;
pub use html::*;
pub use markdown::*;
pub use text::*;

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SnatchError};
use crate::model::Archive;
use crate::reader::load_archive;
use crate::util::AtomicFile;

/// Options shared across formats.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Render thread replies under their parents.
    pub include_threads: bool,
    /// Render join/leave style notices.
    pub include_system: bool,
    /// Render the channel header block.
    pub include_header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_threads: true,
            include_system: true,
            include_header: true,
        }
    }
}

impl ExportOptions {
    /// Builder: include thread replies.
    #[must_use]
    pub fn with_threads(mut self, include: bool) -> Self {
        self.include_threads = include;
        self
    }

    /// Builder: include system notices.
    #[must_use]
    pub fn with_system(mut self, include: bool) -> Self {
        self.include_system = include;
        self
    }

    /// Builder: include the header block.
    #[must_use]
    pub fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }
}

/// Output format for a converted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// HTML page.
    Html,
    /// Markdown document.
    Markdown,
    /// Plain text log.
    Text,
    /// CSV table.
    Csv,
}

impl ExportFormat {
    /// Formats produced by `all`.
    pub const PRESENTATION: [Self; 3] = [Self::Html, Self::Markdown, Self::Text];

    /// Get the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Text => "txt",
            Self::Csv => "csv",
        }
    }

    /// Parse format from string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "html" | "htm" => Some(Self::Html),
            "markdown" | "md" => Some(Self::Markdown),
            "text" | "txt" => Some(Self::Text),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Parse a format name or `all`.
    #[must_use]
    pub fn parse_selection(s: &str) -> Option<Vec<Self>> {
        if s.eq_ignore_ascii_case("all") {
            Some(Self::PRESENTATION.to_vec())
        } else {
            Self::from_str(s).map(|f| vec![f])
        }
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Render an archive to the writer.
    fn export_archive<W: Write>(
        &self,
        archive: &Archive,
        writer: &mut W,
        options: &ExportOptions,
    ) -> Result<()>;
}

fn export_with<W: Write>(
    archive: &Archive,
    format: ExportFormat,
    writer: &mut W,
    options: &ExportOptions,
) -> Result<()> {
    match format {
        ExportFormat::Html => HtmlExporter::new().export_archive(archive, writer, options),
        ExportFormat::Markdown => MarkdownExporter::new().export_archive(archive, writer, options),
        ExportFormat::Text => TextExporter::new().export_archive(archive, writer, options),
        ExportFormat::Csv => CsvExporter::new().export_archive(archive, writer, options),
    }
}

/// Export an archive to a file, atomically.
pub fn export_to_file(
    archive: &Archive,
    path: impl AsRef<Path>,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<()> {
    let path = path.as_ref();

    let mut atomic = AtomicFile::create(path)?;
    let mut writer = std::io::BufWriter::new(atomic.writer());

    export_with(archive, format, &mut writer, options)?;

    writer.flush().map_err(|e| {
        SnatchError::io(format!("Failed to flush output file: {}", path.display()), e)
    })?;

    // Release the borrow on atomic.writer()
    drop(writer);

    atomic.finish()?;

    Ok(())
}

/// Export an archive to a string.
pub fn export_to_string(
    archive: &Archive,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<String> {
    let mut buffer = Vec::new();
    export_with(archive, format, &mut buffer, options)?;
    String::from_utf8(buffer).map_err(SnatchError::from)
}

/// Where a converted file goes.
///
/// Without an explicit base, the output sits next to the source with the
/// format's extension. With a base, the extension is appended to it.
#[must_use]
pub fn output_path(source: &Path, base: Option<&Path>, format: ExportFormat) -> PathBuf {
    match base {
        Some(base) => {
            let mut name = OsString::from(base.as_os_str());
            name.push(".");
            name.push(format.extension());
            PathBuf::from(name)
        }
        None => source.with_extension(format.extension()),
    }
}

/// Convert one artifact into each requested format; returns the files written.
pub fn convert_archive(
    source: impl AsRef<Path>,
    formats: &[ExportFormat],
    base: Option<&Path>,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>> {
    let source = source.as_ref();
    let archive = load_archive(source)?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = output_path(source, base, format);
        export_to_file(&archive, &path, format, options)?;
        info!(format = format.extension(), path = %path.display(), "Converted artifact");
        written.push(path);
    }
    Ok(written)
}
