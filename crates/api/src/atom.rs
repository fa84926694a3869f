//! Minimal Atom 1.0 (RFC 4287) document writer for the notices feed.

use std::fmt::Write;

use chrono::{DateTime, Utc};

pub const CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";

#[derive(Debug, Clone)]
pub struct AtomEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub updated: DateTime<Utc>,
    pub published: DateTime<Utc>,
    /// HTML content; escaped once more when written.
    pub content_html: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AtomFeed {
    pub id: String,
    pub title: String,
    pub link: String,
    pub updated: DateTime<Utc>,
    pub entries: Vec<AtomEntry>,
}

impl AtomFeed {
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(512 + self.entries.len() * 512);
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        out.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
        element(&mut out, 1, "id", &self.id);
        element(&mut out, 1, "title", &self.title);
        link(&mut out, 1, &self.link);
        element(&mut out, 1, "updated", &self.updated.to_rfc3339());

        for entry in &self.entries {
            out.push_str("  <entry>\n");
            element(&mut out, 2, "id", &entry.id);
            element(&mut out, 2, "title", &entry.title);
            link(&mut out, 2, &entry.link);
            element(&mut out, 2, "updated", &entry.updated.to_rfc3339());
            element(&mut out, 2, "published", &entry.published.to_rfc3339());
            if let Some(author) = &entry.author {
                out.push_str("    <author>\n");
                element(&mut out, 3, "name", author);
                out.push_str("    </author>\n");
            }
            let _ = writeln!(
                out,
                "    <content type=\"html\">{}</content>",
                escape_xml(&entry.content_html)
            );
            out.push_str("  </entry>\n");
        }

        out.push_str("</feed>\n");
        out
    }
}

fn element(out: &mut String, depth: usize, name: &str, text: &str) {
    let _ = writeln!(
        out,
        "{}<{name}>{}</{name}>",
        "  ".repeat(depth),
        escape_xml(text)
    );
}

fn link(out: &mut String, depth: usize, href: &str) {
    let _ = writeln!(
        out,
        "{}<link rel=\"alternate\" href=\"{}\"/>",
        "  ".repeat(depth),
        escape_xml(href)
    );
}

/// Escape text for XML element content and attribute values. Control
/// characters XML 1.0 cannot carry are dropped.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

/// Remove `<...>` tags, keeping the text between them.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Escape plain text as HTML and turn line breaks into paragraphs and `<br>`.
pub fn linebreaks(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", escape_xml(p.trim()).replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n\n")
}
