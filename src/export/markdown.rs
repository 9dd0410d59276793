//! Markdown export.
//!
//! Slack mrkdwn is close enough to Markdown that message bodies pass through
//! with only mentions and links rewritten.

use std::io::Write;

use super::markup::{parse, MentionResolver, Segment};
use super::{ExportOptions, Exporter};
use crate::error::Result;
use crate::model::{Archive, Message};

/// Markdown exporter.
#[derive(Debug, Clone)]
pub struct MarkdownExporter {
    /// Label written above thread replies.
    replies_label: String,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownExporter {
    /// Create a new Markdown exporter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            replies_label: "Thread replies".to_string(),
        }
    }

    /// Set the label written above thread replies.
    #[must_use]
    pub fn replies_label(mut self, label: impl Into<String>) -> Self {
        self.replies_label = label.into();
        self
    }

    fn write_header<W: Write>(&self, writer: &mut W, archive: &Archive) -> Result<()> {
        let meta = &archive.metadata;
        writeln!(writer, "# #{}", meta.channel_name)?;
        writeln!(writer)?;
        writeln!(
            writer,
            "- **Archived:** {}",
            meta.archived_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(writer, "- **Channel ID:** {}", meta.channel_id)?;
        writeln!(writer, "- **Messages:** {}", archive.messages.len())?;
        writeln!(
            writer,
            "- **Private:** {}",
            if meta.is_private { "yes" } else { "no" }
        )?;
        if !meta.channel_topic.is_empty() {
            writeln!(writer, "- **Topic:** {}", meta.channel_topic)?;
        }
        if !meta.channel_purpose.is_empty() {
            writeln!(writer, "- **Purpose:** {}", meta.channel_purpose)?;
        }
        writeln!(writer)?;
        writeln!(writer, "---")?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_message<W: Write>(
        &self,
        writer: &mut W,
        msg: &Message,
        resolver: &MentionResolver,
        options: &ExportOptions,
    ) -> Result<()> {
        let body = render_markdown(&msg.text, resolver);

        if msg.is_system() {
            writeln!(writer, "_{}_ - _{}_", msg.display_time(), body.trim())?;
            writeln!(writer)?;
        } else {
            writeln!(writer, "**{}** _{}_", msg.author(), msg.display_time())?;
            writeln!(writer)?;
            writeln!(writer, "{body}")?;
            writeln!(writer)?;

            if options.include_threads && !msg.thread_messages.is_empty() {
                writeln!(writer, "**{}:**", self.replies_label)?;
                writeln!(writer)?;
                for reply in &msg.thread_messages {
                    self.write_reply(writer, reply, resolver)?;
                }
            }
        }

        writeln!(writer, "---")?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_reply<W: Write>(
        &self,
        writer: &mut W,
        reply: &Message,
        resolver: &MentionResolver,
    ) -> Result<()> {
        writeln!(writer, "> **{}** _{}_", reply.author(), reply.display_time())?;
        writeln!(writer, ">")?;
        for line in render_markdown(&reply.text, resolver).lines() {
            if line.is_empty() {
                writeln!(writer, ">")?;
            } else {
                writeln!(writer, "> {line}")?;
            }
        }
        writeln!(writer)?;
        Ok(())
    }
}

impl Exporter for MarkdownExporter {
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
            self.write_message(writer, msg, &resolver, options)?;
        }
        Ok(())
    }
}

/// Render message text as Markdown.
#[must_use]
pub fn render_markdown(text: &str, resolver: &MentionResolver) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in parse(text) {
        match segment {
            Segment::Text(t) => out.push_str(&t),
            Segment::User { id, label } => out.push_str(&resolver.user(id, label)),
            Segment::Channel { id, name } => out.push_str(&resolver.channel(id, name)),
            Segment::Broadcast { name, label } => out.push_str(&resolver.broadcast(name, label)),
            Segment::Link { url, label: Some(label) } => {
                out.push_str(&format!("[{}]({url})", label.replace(']', "\\]")));
            }
            Segment::Link { url, label: None } => out.push_str(&format!("<{url}>")),
        }
    }
    out
}
