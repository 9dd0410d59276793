//! Plain text export.

use std::io::Write;

use super::markup::MentionResolver;
use super::{ExportOptions, Exporter};
use crate::error::Result;
use crate::model::{Archive, Message};

/// Indent before reply glyphs.
const REPLY_INDENT: &str = "    ";

/// Plain text exporter.
#[derive(Debug, Clone)]
pub struct TextExporter {
    /// Width of the `=` rule under the header.
    rule_width: usize,
}

impl Default for TextExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExporter {
    /// Create a new plain text exporter.
    #[must_use]
    pub fn new() -> Self {
        Self { rule_width: 60 }
    }

    /// Set the width of the header rule.
    #[must_use]
    pub fn rule_width(mut self, width: usize) -> Self {
        self.rule_width = width;
        self
    }

    fn write_header<W: Write>(&self, writer: &mut W, archive: &Archive) -> Result<()> {
        let meta = &archive.metadata;
        writeln!(writer, "Slack Archive - #{}", meta.channel_name)?;
        writeln!(
            writer,
            "Archived: {}",
            meta.archived_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(writer, "Channel ID: {}", meta.channel_id)?;
        writeln!(writer, "Messages: {}", archive.messages.len())?;
        if !meta.channel_topic.is_empty() {
            writeln!(writer, "Topic: {}", meta.channel_topic)?;
        }
        writeln!(writer)?;
        writeln!(writer, "{}", "=".repeat(self.rule_width))?;
        writeln!(writer)?;
        Ok(())
    }
}

/// Indent continuation lines so multi-line bodies stay under their author.
fn continue_lines(text: &str, indent: &str) -> String {
    text.replace('\n', &format!("\n{indent}"))
}

fn write_line<W: Write>(
    writer: &mut W,
    prefix: &str,
    msg: &Message,
    resolver: &MentionResolver,
) -> Result<()> {
    let body = continue_lines(&resolver.plain(&msg.text), &" ".repeat(prefix.chars().count() + 2));
    if msg.is_system() {
        writeln!(writer, "{prefix}[{}] {body}", msg.display_time())?;
    } else {
        writeln!(writer, "{prefix}[{}] {}: {body}", msg.display_time(), msg.author())?;
    }
    Ok(())
}

impl Exporter for TextExporter {
    fn export_archive<W: Write>(
        &self,
        archive: &Archive,
        writer: &mut W,
        options: &ExportOptions,
    ) -> Result<()> {
        let resolver = MentionResolver::from_archive(archive);
        if options.include_header {
            self.write_header(writer, archive)?;
        }

        for msg in &archive.messages {
            if msg.is_system() && !options.include_system {
                continue;
            }
            write_line(writer, "", msg, &resolver)?;

            if options.include_threads {
                let last = msg.thread_messages.len().saturating_sub(1);
                for (i, reply) in msg.thread_messages.iter().enumerate() {
                    let glyph = if i == last { "└─ " } else { "├─ " };
                    write_line(writer, &format!("{REPLY_INDENT}{glyph}"), reply, &resolver)?;
                }
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}
