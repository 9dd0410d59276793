//! HTML exporter.
//!
//! Produces a standalone page with inline CSS. Each message is a
//! `div.message`; system notices add `system-message`; thread replies are
//! nested `div.thread-reply` blocks inside their parent.

use std::io::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use super::markup::{parse, MentionResolver, Segment};
use super::{ExportOptions, Exporter};
use crate::error::Result;
use crate::model::{Archive, Message};

static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^\w*])\*([^*\n]+)\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^\w_])_([^_\n]+)_").unwrap());
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new("\u{E000}([0-9]+)\u{E001}").unwrap());

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// HTML exporter.
#[derive(Debug, Clone)]
pub struct HtmlExporter {
    /// Page title; defaults to the channel name.
    title: Option<String>,
    /// Embed the stylesheet.
    inline_styles: bool,
}

impl Default for HtmlExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlExporter {
    /// Create a new HTML exporter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: None,
            inline_styles: true,
        }
    }

    /// Set the page title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Embed the stylesheet or leave the page unstyled.
    #[must_use]
    pub fn inline_styles(mut self, enabled: bool) -> Self {
        self.inline_styles = enabled;
        self
    }

    fn write_document_start<W: Write>(&self, writer: &mut W, title: &str) -> Result<()> {
        writeln!(writer, "<!DOCTYPE html>")?;
        writeln!(writer, "<html lang=\"en\">")?;
        writeln!(writer, "<head>")?;
        writeln!(writer, "  <meta charset=\"UTF-8\">")?;
        writeln!(
            writer,
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">"
        )?;
        writeln!(
            writer,
            "  <meta name=\"generator\" content=\"slack-snatch {}\">",
            crate::VERSION
        )?;
        writeln!(writer, "  <title>{}</title>", escape_html(title))?;
        if self.inline_styles {
            write_styles(writer)?;
        }
        writeln!(writer, "</head>")?;
        writeln!(writer, "<body>")?;
        Ok(())
    }

    fn write_header<W: Write>(&self, writer: &mut W, archive: &Archive) -> Result<()> {
        let meta = &archive.metadata;
        writeln!(writer, "<div class=\"header\">")?;
        writeln!(writer, "  <h1>#{}</h1>", escape_html(&meta.channel_name))?;
        writeln!(
            writer,
            "  <p><strong>Archived:</strong> {}</p>",
            meta.archived_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(
            writer,
            "  <p><strong>Channel ID:</strong> {}</p>",
            escape_html(&meta.channel_id)
        )?;
        writeln!(
            writer,
            "  <p><strong>Messages:</strong> {}</p>",
            archive.messages.len()
        )?;
        if !meta.channel_topic.is_empty() {
            writeln!(
                writer,
                "  <p><strong>Topic:</strong> {}</p>",
                escape_html(&meta.channel_topic)
            )?;
        }
        if !meta.channel_purpose.is_empty() {
            writeln!(
                writer,
                "  <p><strong>Purpose:</strong> {}</p>",
                escape_html(&meta.channel_purpose)
            )?;
        }
        writeln!(writer, "</div>")?;
        Ok(())
    }

    fn write_message<W: Write>(
        &self,
        writer: &mut W,
        msg: &Message,
        resolver: &MentionResolver,
        options: &ExportOptions,
    ) -> Result<()> {
        let class = if msg.is_system() {
            "message system-message"
        } else {
            "message"
        };
        writeln!(writer, "<div class=\"{class}\" id=\"m{}\">", escape_html(&msg.ts))?;
        write_body(writer, msg, resolver, "  ")?;

        if options.include_threads {
            for reply in &msg.thread_messages {
                writeln!(writer, "  <div class=\"thread-reply\">")?;
                write_body(writer, reply, resolver, "    ")?;
                writeln!(writer, "  </div>")?;
            }
        }

        writeln!(writer, "</div>")?;
        Ok(())
    }
}

impl Exporter for HtmlExporter {
    fn export_archive<W: Write>(
        &self,
        archive: &Archive,
        writer: &mut W,
        options: &ExportOptions,
    ) -> Result<()> {
        let resolver = MentionResolver::from_archive(archive);
        let title = self
            .title
            .clone()
            .unwrap_or_else(|| format!("#{} - Slack Archive", archive.metadata.channel_name));

        self.write_document_start(writer, &title)?;
        if options.include_header {
            self.write_header(writer, archive)?;
        }

        writeln!(writer, "<main class=\"messages\">")?;
        for msg in &archive.messages {
            if msg.is_system() && !options.include_system {
                continue;
            }
            self.write_message(writer, msg, &resolver, options)?;
        }
        writeln!(writer, "</main>")?;

        writeln!(writer, "</body>")?;
        writeln!(writer, "</html>")?;
        Ok(())
    }
}

fn write_body<W: Write>(
    writer: &mut W,
    msg: &Message,
    resolver: &MentionResolver,
    indent: &str,
) -> Result<()> {
    writeln!(writer, "{indent}<div class=\"message-header\">")?;
    writeln!(
        writer,
        "{indent}  <span class=\"username\">{}</span>",
        escape_html(msg.author())
    )?;
    writeln!(
        writer,
        "{indent}  <span class=\"timestamp\">{}</span>",
        escape_html(&msg.display_time())
    )?;
    writeln!(writer, "{indent}</div>")?;
    writeln!(
        writer,
        "{indent}<div class=\"message-text\">{}</div>",
        render_html(&msg.text, resolver)
    )?;
    Ok(())
}

/// Render message text as HTML: escaped, with mentions, links and inline styles.
///
/// Inline styles run over the whole message, so `*ping <@U1> now*` bolds the
/// mention along with the words around it.
#[must_use]
pub fn render_html(text: &str, resolver: &MentionResolver) -> String {
    // Non-text segments become placeholders until emphasis has been applied.
    let mut escaped = String::with_capacity(text.len() + 16);
    let mut pieces = Vec::new();
    for segment in parse(text) {
        let piece = match segment {
            Segment::Text(t) => {
                let t = t.replace([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE], "\u{FFFD}");
                escaped.push_str(&escape_html(&t));
                continue;
            }
            Segment::User { id, label } => format!(
                "<span class=\"mention\">{}</span>",
                escape_html(&resolver.user(id, label))
            ),
            Segment::Channel { id, name } => format!(
                "<span class=\"mention channel\">{}</span>",
                escape_html(&resolver.channel(id, name))
            ),
            Segment::Broadcast { name, label } => format!(
                "<span class=\"mention broadcast\">{}</span>",
                escape_html(&resolver.broadcast(name, label))
            ),
            Segment::Link { url, label } => {
                let text = label.as_deref().unwrap_or(url.as_ref());
                format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                    escape_html(&url),
                    escape_html(text)
                )
            }
        };
        escaped.push(PLACEHOLDER_OPEN);
        escaped.push_str(&pieces.len().to_string());
        escaped.push(PLACEHOLDER_CLOSE);
        pieces.push(piece);
    }

    let styled = format_inline(&escaped);
    let out = PLACEHOLDER.replace_all(&styled, |caps: &regex::Captures<'_>| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| pieces.get(i))
            .cloned()
            .unwrap_or_default()
    });
    out.replace('\n', "<br>\n")
}

/// Apply `*bold*`, `_italic_` and `` `code` `` to already escaped text.
fn format_inline(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut last = 0;
    for caps in CODE.captures_iter(escaped) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&emphasis(&escaped[last..whole.start()]));
        out.push_str("<code>");
        out.push_str(code.as_str());
        out.push_str("</code>");
        last = whole.end();
    }
    out.push_str(&emphasis(&escaped[last..]));
    out
}

fn emphasis(text: &str) -> String {
    let bold = BOLD.replace_all(text, "${1}<strong>${2}</strong>");
    ITALIC.replace_all(&bold, "${1}<em>${2}</em>").into_owned()
}

fn write_styles<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "  <style>")?;
    writeln!(
        writer,
        r#"
    body {{
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
      max-width: 1000px;
      margin: 0 auto;
      padding: 20px;
      background-color: #f8f9fa;
      color: #1d1c1d;
    }}

    .header, .message {{
      background: #ffffff;
      border-radius: 8px;
      box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1);
    }}

    .header {{
      padding: 20px;
      margin-bottom: 20px;
    }}

    .message {{
      margin: 10px 0;
      padding: 15px;
    }}

    .message-header {{
      display: flex;
      align-items: baseline;
      gap: 10px;
      margin-bottom: 5px;
    }}

    .username {{
      font-weight: bold;
      color: #1264a3;
    }}

    .timestamp {{
      color: #616061;
      font-size: 12px;
    }}

    .message-text {{
      line-height: 1.4;
      overflow-wrap: anywhere;
    }}

    .system-message {{
      background: #f1f2f3;
      font-style: italic;
      color: #616061;
    }}

    .thread-reply {{
      margin: 10px 0 0 20px;
      border-left: 3px solid #1264a3;
      padding-left: 15px;
    }}

    .mention {{
      background: #e8f5fa;
      color: #1264a3;
      border-radius: 3px;
      padding: 0 2px;
    }}

    code {{
      background: #f4f4f4;
      border: 1px solid #e1e1e1;
      border-radius: 3px;
      padding: 0 3px;
      font-size: 0.9em;
    }}
"#
    )?;
    writeln!(writer, "  </style>")?;
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
