// src/ingest/mod.rs
pub mod parse;
pub mod providers;
pub mod types;

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::types::{Candidate, FeedEntry, SourceProvider};
use crate::memory::MemoryStore;

/// Upper bound on the body handed to the summarizer.
pub const MAX_BODY_CHARS: usize = 6000;

/// How unpublished entries are pooled across sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// At most one qualifying entry per source, first in document order.
    NewestPerSource,
    /// Every qualifying entry from every source.
    #[default]
    FullPool,
}

#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    pub policy: AggregationPolicy,
    /// When set, entries older than this (or undated) are skipped.
    pub max_age: Option<Duration>,
    pub junk_links: Vec<Regex>,
}

/// Pool plus the bookkeeping of what was dropped and why.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub pool: Vec<Candidate>,
    pub failed_sources: Vec<String>,
    pub seen: usize,
    pub skipped_published: usize,
    pub skipped_junk: usize,
    pub skipped_stale: usize,
    pub skipped_duplicate: usize,
}

/// Normalize markup into plain text: decode entities, strip tags, fold
/// typographic quotes, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    static RE_BLOCKS: once_cell::sync::OnceCell<Regex> = once_cell::sync::OnceCell::new();
    static RE_TAGS: once_cell::sync::OnceCell<Regex> = once_cell::sync::OnceCell::new();
    static RE_WS: once_cell::sync::OnceCell<Regex> = once_cell::sync::OnceCell::new();

    // 1) HTML entity decode, so escaped markup is stripped like real markup
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Drop script/style blocks wholesale
    let re_blocks = RE_BLOCKS
        .get_or_init(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap());
    out = re_blocks.replace_all(&out, " ").to_string();

    // 3) Strip tags (replaced by a space so adjacent paragraphs don't fuse)
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 4) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 5) Collapse whitespace
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 6) Length cap
    if out.chars().count() > MAX_BODY_CHARS {
        out = out.chars().take(MAX_BODY_CHARS).collect();
    }

    out
}

pub fn is_junk_link(link: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(link))
}

fn is_stale(entry: &FeedEntry, max_age: Option<Duration>, now: DateTime<Utc>) -> bool {
    match max_age {
        None => false,
        Some(age) => match entry.published {
            Some(ts) => ts < now - age,
            None => true,
        },
    }
}

/// Turn one source's entries into candidates, applying filters in order:
/// junk link, age, already published, already pooled from an earlier source.
/// `pooled` carries links taken so far across sources.
pub fn collect_candidates(
    label: &str,
    entries: Vec<FeedEntry>,
    memory: &MemoryStore,
    opts: &AggregateOptions,
    now: DateTime<Utc>,
    pooled: &mut HashSet<String>,
    report: &mut AggregateReport,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for entry in entries {
        report.seen += 1;
        if is_junk_link(&entry.link, &opts.junk_links) {
            report.skipped_junk += 1;
            continue;
        }
        if is_stale(&entry, opts.max_age, now) {
            report.skipped_stale += 1;
            continue;
        }
        if memory.has_published(&entry.link) {
            report.skipped_published += 1;
            continue;
        }
        if pooled.contains(&entry.link) {
            report.skipped_duplicate += 1;
            continue;
        }

        pooled.insert(entry.link.clone());
        out.push(Candidate {
            title: normalize_text(&entry.title),
            body: normalize_text(&entry.body),
            link: entry.link,
            source: label.to_string(),
            published: entry.published,
        });
        if opts.policy == AggregationPolicy::NewestPerSource {
            break;
        }
    }
    out
}

/// Visit every source in order and build the unpublished pool.
/// A failing source contributes nothing; the others still count.
pub async fn aggregate(
    sources: &[Box<dyn SourceProvider>],
    memory: &MemoryStore,
    opts: &AggregateOptions,
    now: DateTime<Utc>,
) -> AggregateReport {
    let mut report = AggregateReport::default();
    let mut pooled = HashSet::new();

    for source in sources {
        let label = source.label();
        match source.fetch_entries().await {
            Ok(entries) => {
                tracing::debug!(source = label, entries = entries.len(), "source fetched");
                let mut kept =
                    collect_candidates(label, entries, memory, opts, now, &mut pooled, &mut report);
                report.pool.append(&mut kept);
            }
            Err(e) => {
                tracing::warn!(source = label, error = %format!("{e:#}"), "source failed, skipping");
                report.failed_sources.push(label.to_string());
            }
        }
    }

    tracing::info!(
        pool = report.pool.len(),
        seen = report.seen,
        published = report.skipped_published,
        junk = report.skipped_junk,
        stale = report.skipped_stale,
        duplicate = report.skipped_duplicate,
        failed_sources = report.failed_sources.len(),
        "aggregation finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMode;

    fn entry(link: &str, published: Option<DateTime<Utc>>) -> FeedEntry {
        FeedEntry {
            title: format!("Title {link}"),
            link: link.to_string(),
            body: "<p>Body&nbsp;text</p>".to_string(),
            published,
        }
    }

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        let s = "<p>Play,&nbsp;in most <b>people’s</b> minds</p>\n\n<p>is “fun”.</p>";
        assert_eq!(normalize_text(s), r#"Play, in most people's minds is "fun"."#);
    }

    #[test]
    fn normalize_text_strips_markup_that_was_still_escaped() {
        // what `parse_feed` hands over for `&amp;lt;p&amp;gt;...` in a description
        let s = "&lt;p&gt;Hello &lt;b&gt;world&lt;/b&gt;&lt;/p&gt;&lt;script&gt;x()&lt;/script&gt;";
        let out = normalize_text(s);
        assert_eq!(out, "Hello world");
        assert!(!out.contains('<'));
    }

    #[test]
    fn normalize_text_keeps_bare_less_than() {
        assert_eq!(normalize_text("a &lt; b and 3 < 4"), "a < b and 3 < 4");
    }

    #[test]
    fn normalize_text_drops_scripts_and_caps_length() {
        let s = format!("<script>var x = 1;</script>{}", "a".repeat(MAX_BODY_CHARS + 10));
        let out = normalize_text(&s);
        assert!(!out.contains("var x"));
        assert_eq!(out.chars().count(), MAX_BODY_CHARS);
    }

    #[test]
    fn filters_apply_and_newest_per_source_stops_early() {
        let now = Utc::now();
        let memory = MemoryStore::from_links(MemoryMode::Set, ["https://x/published"]);
        let opts = AggregateOptions {
            policy: AggregationPolicy::NewestPerSource,
            max_age: Some(Duration::days(2)),
            junk_links: vec![Regex::new("/tag/").unwrap()],
        };
        let entries = vec![
            entry("https://x/tag/ideas", Some(now)),
            entry("https://x/old", Some(now - Duration::days(5))),
            entry("https://x/undated", None),
            entry("https://x/published", Some(now)),
            entry("https://x/fresh", Some(now - Duration::hours(3))),
            entry("https://x/fresh-2", Some(now)),
        ];
        let mut pooled = HashSet::new();
        let mut report = AggregateReport::default();
        let out = collect_candidates("Aeon", entries, &memory, &opts, now, &mut pooled, &mut report);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].link, "https://x/fresh");
        assert_eq!(out[0].source, "Aeon");
        assert_eq!(out[0].body, "Body text");
        assert_eq!(report.skipped_junk, 1);
        assert_eq!(report.skipped_stale, 2);
        assert_eq!(report.skipped_published, 1);
    }

    #[test]
    fn same_link_from_second_source_is_a_duplicate() {
        let now = Utc::now();
        let memory = MemoryStore::from_links(MemoryMode::Set, Vec::<String>::new());
        let opts = AggregateOptions::default();
        let mut pooled = HashSet::new();
        let mut report = AggregateReport::default();

        let a = collect_candidates(
            "A",
            vec![entry("u1", None)],
            &memory,
            &opts,
            now,
            &mut pooled,
            &mut report,
        );
        let b = collect_candidates(
            "B",
            vec![entry("u1", None), entry("u2", None)],
            &memory,
            &opts,
            now,
            &mut pooled,
            &mut report,
        );
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].link, "u2");
        assert_eq!(report.skipped_duplicate, 1);
    }
}
