//! Slack mrkdwn tokenizer shared by the presentation exporters.
//!
//! Message text is split into [`Segment`]s: plain text (entities decoded),
//! user and channel mentions, broadcast mentions and links. Each exporter
//! renders the segments its own way.

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Archive;

/// Angle-bracket tokens (`<@U1>`, `<#C1|general>`, `<https://…|label>`) or bare URLs.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([^<>\s][^<>]*)>|(https?://[^\s<>]+)").unwrap());

/// One piece of message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Plain text with `&amp;`, `&lt;` and `&gt;` decoded.
    Text(Cow<'a, str>),
    /// `<@U123>` or `<@U123|label>`.
    User {
        /// User ID.
        id: &'a str,
        /// Label sent with the mention.
        label: Option<&'a str>,
    },
    /// `<#C123>` or `<#C123|name>`.
    Channel {
        /// Channel ID.
        id: &'a str,
        /// Channel name sent with the mention.
        name: Option<&'a str>,
    },
    /// `<!here>`, `<!channel>`, `<!subteam^S1|@team>`, ...
    Broadcast {
        /// Keyword after the `!`.
        name: &'a str,
        /// Label sent with the mention.
        label: Option<&'a str>,
    },
    /// `<https://…>`, `<mailto:…|label>` or a bare `http(s)://` URL.
    Link {
        /// Target URL.
        url: Cow<'a, str>,
        /// Link text, if different from the URL.
        label: Option<Cow<'a, str>>,
    },
}

/// Decode the three entities Slack escapes in message text.
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&"),
    )
}

fn non_empty(label: Option<&str>) -> Option<&str> {
    label.filter(|l| !l.is_empty())
}

fn angle_segment(inner: &str) -> Segment<'_> {
    let (target, label) = match inner.split_once('|') {
        Some((target, label)) => (target, non_empty(Some(label))),
        None => (inner, None),
    };

    if let Some(id) = target.strip_prefix('@') {
        Segment::User { id, label }
    } else if let Some(id) = target.strip_prefix('#') {
        Segment::Channel { id, name: label }
    } else if let Some(name) = target.strip_prefix('!') {
        Segment::Broadcast { name, label }
    } else {
        Segment::Link {
            url: decode_entities(target),
            label: label.map(decode_entities),
        }
    }
}

/// Split a bare URL from punctuation that ends the sentence around it.
fn trim_url(url: &str) -> (&str, &str) {
    let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'', '"']);
    url.split_at(trimmed.len())
}

fn push_text<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
    if !text.is_empty() {
        segments.push(Segment::Text(decode_entities(text)));
    }
}

/// Tokenize message text.
#[must_use]
pub fn parse(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in TOKEN.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        push_text(&mut segments, &text[last..whole.start()]);

        if let Some(inner) = caps.get(1) {
            segments.push(angle_segment(inner.as_str()));
            last = whole.end();
        } else if let Some(bare) = caps.get(2) {
            let (url, tail) = trim_url(bare.as_str());
            segments.push(Segment::Link {
                url: decode_entities(url),
                label: None,
            });
            last = whole.end() - tail.len();
        }
    }

    push_text(&mut segments, &text[last..]);
    segments
}

/// Resolves mention targets to display text.
///
/// User names come from the artifact's own authors, so a converted file
/// needs no API access.
#[derive(Debug, Clone, Default)]
pub struct MentionResolver {
    users: HashMap<String, String>,
}

impl MentionResolver {
    /// Collect `user -> user_name` pairs from every record in an archive.
    #[must_use]
    pub fn from_archive(archive: &Archive) -> Self {
        let users = archive
            .all_records()
            .filter_map(|m| Some((m.user.clone()?, m.user_name.clone()?)))
            .collect();
        Self { users }
    }

    /// Build from an explicit map.
    #[must_use]
    pub fn from_map(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// `@name` for a user mention.
    #[must_use]
    pub fn user(&self, id: &str, label: Option<&str>) -> String {
        let name = self
            .users
            .get(id)
            .map(String::as_str)
            .or(label)
            .unwrap_or(id);
        format!("@{}", name.trim_start_matches('@'))
    }

    /// `#name` for a channel mention.
    #[must_use]
    pub fn channel(&self, id: &str, name: Option<&str>) -> String {
        format!("#{}", name.unwrap_or(id))
    }

    /// `@here`, `@channel`, or the group label for a broadcast mention.
    #[must_use]
    pub fn broadcast(&self, name: &str, label: Option<&str>) -> String {
        if let Some(label) = label {
            return format!("@{}", label.trim_start_matches('@'));
        }
        let keyword = name.split('^').next().unwrap_or(name);
        format!("@{keyword}")
    }

    /// Plain-text rendering of a whole message: mentions resolved, links as `label (url)`.
    #[must_use]
    pub fn plain(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for segment in parse(text) {
            match segment {
                Segment::Text(t) => out.push_str(&t),
                Segment::User { id, label } => out.push_str(&self.user(id, label)),
                Segment::Channel { id, name } => out.push_str(&self.channel(id, name)),
                Segment::Broadcast { name, label } => out.push_str(&self.broadcast(name, label)),
                Segment::Link { url, label: Some(label) } if label != url => {
                    out.push_str(&label);
                    out.push_str(" (");
                    out.push_str(&url);
                    out.push(')');
                }
                Segment::Link { url, .. } => out.push_str(&url),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver() -> MentionResolver {
        MentionResolver::from_map(HashMap::from([("U1".to_string(), "Alice".to_string())]))
    }

    #[test]
    fn test_parse_mixed_tokens() {
        let segments = parse("hi <@U1>, see <#C9|dev> and <https://x.io/a?b=1&amp;c=2|docs>!");
        assert_eq!(
            segments,
            vec![
                Segment::Text("hi ".into()),
                Segment::User { id: "U1", label: None },
                Segment::Text(", see ".into()),
                Segment::Channel { id: "C9", name: Some("dev") },
                Segment::Text(" and ".into()),
                Segment::Link {
                    url: "https://x.io/a?b=1&c=2".into(),
                    label: Some("docs".into()),
                },
                Segment::Text("!".into()),
            ]
        );
    }

    #[test]
    fn test_bare_url_keeps_trailing_punctuation_as_text() {
        let segments = parse("go to https://example.com/path.");
        assert_eq!(
            segments,
            vec![
                Segment::Text("go to ".into()),
                Segment::Link {
                    url: "https://example.com/path".into(),
                    label: None
                },
                Segment::Text(".".into()),
            ]
        );
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(decode_entities("a &lt;b&gt; &amp;amp;"), "a <b> &amp;");
        assert_eq!(
            parse("1 &lt; 2"),
            vec![Segment::Text(Cow::Owned("1 < 2".to_string()))]
        );
    }

    #[test]
    fn test_plain_rendering() {
        let r = resolver();
        assert_eq!(
            r.plain("<!here> <@U1> <@U2|bob> <@U3> in <#C1> <mailto:a@b.c|mail me>"),
            "@here @Alice @bob @U3 in #C1 mail me (mailto:a@b.c)"
        );
        assert_eq!(r.plain("<!subteam^S123|@oncall> ping"), "@oncall ping");
        assert_eq!(r.plain("<https://a.io>"), "https://a.io");
    }

    #[test]
    fn test_no_tokens() {
        assert_eq!(parse(""), Vec::new());
        assert_eq!(parse("just words"), vec![Segment::Text("just words".into())]);
    }
}
