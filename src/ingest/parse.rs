// src/ingest/parse.rs
//! RSS 2.0 / Atom parsing into [`FeedEntry`] values.
//!
//! Event-driven on purpose: feeds in the wild mix namespaces (`content:encoded`,
//! `dc:date`) and nested markup inside Atom `<content>`, which a fixed serde
//! shape does not survive.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::FeedEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    Content,
    Published,
    Updated,
}

#[derive(Debug, Default)]
struct Draft {
    title: String,
    link: String,
    description: String,
    content: String,
    published: String,
    updated: String,
}

impl Draft {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::Content => &mut self.content,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        }
    }

    fn push_text(&mut self, field: Field, text: &str) {
        let slot = self.slot(field);
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(text);
    }

    fn finish(self) -> Option<FeedEntry> {
        let link = self.link.trim().to_string();
        if link.is_empty() {
            return None;
        }
        let body = if self.content.trim().is_empty() {
            self.description
        } else {
            self.content
        };
        let published = parse_date(&self.published).or_else(|| parse_date(&self.updated));
        Some(FeedEntry {
            title: self.title.trim().to_string(),
            link,
            body,
            published,
        })
    }
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"description" | b"summary" => Some(Field::Description),
        b"content:encoded" | b"content" => Some(Field::Content),
        b"pubDate" | b"published" | b"dc:date" => Some(Field::Published),
        b"updated" => Some(Field::Updated),
        _ => None,
    }
}

fn is_entry(name: &[u8]) -> bool {
    matches!(name, b"item" | b"entry")
}

fn is_feed_root(name: &[u8]) -> bool {
    matches!(name, b"rss" | b"feed" | b"rdf:RDF")
}

/// Atom links live in attributes: `<link rel="alternate" href="..."/>`.
fn atom_href(e: &BytesStart<'_>) -> Option<String> {
    let rel = e
        .try_get_attribute("rel")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    if rel.as_deref().is_some_and(|r| r != "alternate") {
        return None;
    }
    e.try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse an RSS or Atom document. Entries keep document order; entries
/// without a link are dropped.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let cleaned = scrub_html_entities_for_xml(xml);
    let mut reader = Reader::from_str(&cleaned);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut saw_root = false;
    let mut draft: Option<Draft> = None;
    let mut field: Option<Field> = None;
    // Element depth below the current entry; only direct children are fields.
    let mut depth = 0usize;

    loop {
        match reader.read_event().context("parsing feed xml")? {
            Event::Start(e) => {
                let name = e.name();
                let name = name.as_ref();
                if is_feed_root(name) {
                    saw_root = true;
                }
                if is_entry(name) {
                    draft = Some(Draft::default());
                    field = None;
                    depth = 0;
                    continue;
                }
                let Some(d) = draft.as_mut() else { continue };
                depth += 1;
                if depth != 1 {
                    continue;
                }
                field = field_for(name);
                if field == Some(Field::Link) && d.link.is_empty() {
                    if let Some(href) = atom_href(&e) {
                        d.link = href;
                    }
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                if name.as_ref() == b"link" && depth == 0 {
                    if let Some(d) = draft.as_mut() {
                        if d.link.is_empty() {
                            if let Some(href) = atom_href(&e) {
                                d.link = href;
                            }
                        }
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                let name = name.as_ref();
                if draft.is_none() {
                    continue;
                }
                if depth == 0 && is_entry(name) {
                    if let Some(entry) = draft.take().and_then(Draft::finish) {
                        entries.push(entry);
                    }
                    continue;
                }
                if depth == 1 {
                    field = None;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(e) => {
                if let (Some(d), Some(f)) = (draft.as_mut(), field) {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    d.push_text(f, &text);
                }
            }
            Event::CData(e) => {
                if let (Some(d), Some(f)) = (draft.as_mut(), field) {
                    d.push_text(f, &String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        bail!("document is not an RSS or Atom feed");
    }
    Ok(entries)
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let unix = OffsetDateTime::parse(raw, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .map(|dt| dt.unix_timestamp())
        .ok()
        // Lenient fallback for zone names like "GMT" / "EST".
        .or_else(|| {
            DateTime::parse_from_rfc2822(raw)
                .ok()
                .map(|dt| dt.timestamp())
        })?;
    DateTime::<Utc>::from_timestamp(unix, 0)
}

/// XML only knows five named entities; feeds routinely leak HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Channel title must not leak</title>
    <link>https://example.com/</link>
    <item>
      <title>Why Play Is a Serious Business</title>
      <link>https://example.com/play</link>
      <pubDate>Tue, 14 Oct 2025 08:00:00 +0000</pubDate>
      <description>Short teaser&nbsp;text</description>
      <content:encoded><![CDATA[<p>Full <b>body</b> here.</p>]]></content:encoded>
    </item>
    <item>
      <title>No link, dropped</title>
      <description>orphan</description>
    </item>
    <item>
      <title>Second</title>
      <link>https://example.com/second</link>
      <description>&lt;p&gt;Escaped html&lt;/p&gt;</description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom feed</title>
  <entry>
    <title>Atom entry</title>
    <link rel="self" href="https://example.org/self"/>
    <link rel="alternate" href="https://example.org/a1"/>
    <updated>2025-10-10T10:00:00Z</updated>
    <summary>Atom summary</summary>
  </entry>
</feed>"#;

    #[test]
    fn rss_items_keep_order_and_prefer_full_content() {
        let entries = parse_feed(RSS).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Why Play Is a Serious Business");
        assert_eq!(entries[0].link, "https://example.com/play");
        assert_eq!(entries[0].body, "<p>Full <b>body</b> here.</p>");
        assert!(entries[0].published.is_some());
        assert_eq!(entries[1].link, "https://example.com/second");
        assert_eq!(entries[1].body, "<p>Escaped html</p>");
        assert!(entries[1].published.is_none());
    }

    #[test]
    fn atom_uses_alternate_link_and_updated_date() {
        let entries = parse_feed(ATOM).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, "https://example.org/a1");
        assert_eq!(entries[0].body, "Atom summary");
        assert_eq!(
            entries[0].published.map(|d| d.timestamp()),
            Some(1_760_090_400)
        );
    }

    #[test]
    fn non_feed_document_is_an_error() {
        let err = parse_feed("<html><body>Not found</body></html>").unwrap_err();
        assert!(err.to_string().contains("not an RSS or Atom feed"));
    }
}
